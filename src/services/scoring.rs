//! Sport-specific score rules: payload shape checks, `matchData` merging and the
//! result computed when a match completes.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    dao::models::{CricketScore, MatchEntity, Sport, TeamScore, TeamSide},
    dto::{
        matches::{ResultSummary, ResultType},
        validation::validate_overs,
    },
    error::ServiceError,
};

/// Key under which the computed result is stored in `matchData`.
pub const RESULT_SUMMARY_KEY: &str = "resultSummary";
/// Key naming the side that batted first in a cricket match (`"team1"` or `"team2"`).
pub const BATTING_FIRST_KEY: &str = "battingFirst";

const MAX_WICKETS: u8 = 10;

/// Check that `score` has the shape expected for `sport`.
pub fn validate_score(sport: Sport, side: TeamSide, score: &TeamScore) -> Result<(), ServiceError> {
    match (sport, score) {
        (Sport::Cricket, TeamScore::Cricket(cricket)) => validate_cricket(side, cricket),
        (Sport::Cricket, TeamScore::Points(_)) => Err(ServiceError::InvalidInput(format!(
            "{} score must be an object with runs, wickets and overs",
            side.as_str()
        ))),
        (_, TeamScore::Points(_)) => Ok(()),
        (other, TeamScore::Cricket(_)) => Err(ServiceError::InvalidInput(format!(
            "{} score must be a number for {}",
            side.as_str(),
            other.as_str()
        ))),
    }
}

fn validate_cricket(side: TeamSide, score: &CricketScore) -> Result<(), ServiceError> {
    if score.wickets > MAX_WICKETS {
        return Err(ServiceError::InvalidInput(format!(
            "{} wickets must be between 0 and {MAX_WICKETS} (got {})",
            side.as_str(),
            score.wickets
        )));
    }
    validate_overs(&score.overs).map_err(|err| {
        ServiceError::InvalidInput(format!(
            "{} {}",
            side.as_str(),
            err.message.unwrap_or_else(|| "overs are invalid".into())
        ))
    })
}

/// Merge `patch` into `target`: present keys overwrite, `null` removes the key.
pub fn merge_match_data(target: &mut IndexMap<String, Value>, patch: IndexMap<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            target.shift_remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

/// Compute the result of a completed match from its final scores.
pub fn compute_result(entity: &MatchEntity) -> Result<ResultSummary, ServiceError> {
    let (Some(team1), Some(team2)) = (&entity.team1_score, &entity.team2_score) else {
        return Err(ServiceError::InvalidInput(
            "both team scores are required to complete a match".into(),
        ));
    };

    match (team1, team2) {
        (TeamScore::Cricket(_), TeamScore::Cricket(_)) => cricket_result(entity),
        (TeamScore::Points(first), TeamScore::Points(second)) => {
            Ok(points_result(entity, *first, *second))
        }
        _ => Err(ServiceError::InvalidInput(
            "team scores have mismatched shapes".into(),
        )),
    }
}

/// Store `summary` under [`RESULT_SUMMARY_KEY`].
pub fn store_result(
    match_data: &mut IndexMap<String, Value>,
    summary: &ResultSummary,
) -> Result<(), ServiceError> {
    let value = serde_json::to_value(summary).map_err(|err| {
        ServiceError::InvalidState(format!("failed to encode result summary: {err}"))
    })?;
    match_data.insert(RESULT_SUMMARY_KEY.to_owned(), value);
    Ok(())
}

fn batting_first(entity: &MatchEntity) -> TeamSide {
    match entity.match_data.get(BATTING_FIRST_KEY).and_then(Value::as_str) {
        Some("team2") => TeamSide::Team2,
        _ => TeamSide::Team1,
    }
}

fn other_side(side: TeamSide) -> TeamSide {
    match side {
        TeamSide::Team1 => TeamSide::Team2,
        TeamSide::Team2 => TeamSide::Team1,
    }
}

fn cricket_score(entity: &MatchEntity, side: TeamSide) -> Option<&CricketScore> {
    match entity.score(side) {
        Some(TeamScore::Cricket(score)) => Some(score),
        _ => None,
    }
}

fn cricket_result(entity: &MatchEntity) -> Result<ResultSummary, ServiceError> {
    let first = batting_first(entity);
    let chaser = other_side(first);
    let (Some(setting), Some(chasing)) =
        (cricket_score(entity, first), cricket_score(entity, chaser))
    else {
        return Err(ServiceError::InvalidInput(
            "both innings are required to complete a cricket match".into(),
        ));
    };

    let summary = if setting.runs > chasing.runs {
        let margin = setting.runs - chasing.runs;
        ResultSummary {
            result_type: ResultType::WonByRuns,
            winner_id: Some(entity.team_id(first).to_owned()),
            margin_runs: Some(margin),
            margin_wickets: None,
            margin_points: None,
            summary_text: format!(
                "{} won by {margin} {}",
                entity.team_name(first),
                plural(margin, "run", "runs")
            ),
        }
    } else if chasing.runs > setting.runs {
        let margin = MAX_WICKETS.saturating_sub(chasing.wickets);
        ResultSummary {
            result_type: ResultType::WonByWickets,
            winner_id: Some(entity.team_id(chaser).to_owned()),
            margin_runs: None,
            margin_wickets: Some(margin),
            margin_points: None,
            summary_text: format!(
                "{} won by {margin} {}",
                entity.team_name(chaser),
                plural(u32::from(margin), "wicket", "wickets")
            ),
        }
    } else {
        ResultSummary {
            result_type: ResultType::Tie,
            winner_id: None,
            margin_runs: None,
            margin_wickets: None,
            margin_points: None,
            summary_text: format!("Match tied on {} runs", setting.runs),
        }
    };

    Ok(summary)
}

fn points_result(entity: &MatchEntity, team1: u32, team2: u32) -> ResultSummary {
    let winner = match team1.cmp(&team2) {
        std::cmp::Ordering::Greater => Some(TeamSide::Team1),
        std::cmp::Ordering::Less => Some(TeamSide::Team2),
        std::cmp::Ordering::Equal => None,
    };

    match winner {
        Some(side) => {
            let margin = team1.abs_diff(team2);
            ResultSummary {
                result_type: ResultType::Won,
                winner_id: Some(entity.team_id(side).to_owned()),
                margin_runs: None,
                margin_wickets: None,
                margin_points: Some(margin),
                summary_text: format!(
                    "{} won {}-{}",
                    entity.team_name(side),
                    team1.max(team2),
                    team1.min(team2)
                ),
            }
        }
        None => ResultSummary {
            result_type: ResultType::Draw,
            winner_id: None,
            margin_runs: None,
            margin_wickets: None,
            margin_points: Some(0),
            summary_text: format!("Match drawn {team1}-{team2}"),
        },
    }
}

fn plural(count: u32, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;

    use super::*;
    use crate::dao::models::MatchStatus;

    fn cricket(runs: u32, wickets: u8, overs: &str) -> TeamScore {
        TeamScore::Cricket(CricketScore {
            runs,
            wickets,
            overs: overs.into(),
        })
    }

    fn sample_match(sport: Sport, team1: TeamScore, team2: TeamScore) -> MatchEntity {
        let now = SystemTime::now();
        MatchEntity {
            id: "m1".into(),
            sport,
            status: MatchStatus::Live,
            team1_id: "lions".into(),
            team2_id: "tigers".into(),
            team1_name: "Lions".into(),
            team2_name: "Tigers".into(),
            team1_score: Some(team1),
            team2_score: Some(team2),
            match_data: IndexMap::new(),
            participants: Vec::new(),
            created_by: "u1".into(),
            venue_id: None,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn batting_first_side_wins_by_runs() {
        let entity = sample_match(
            Sport::Cricket,
            cricket(150, 7, "20"),
            cricket(140, 9, "20"),
        );
        let result = compute_result(&entity).unwrap();

        assert_eq!(result.result_type, ResultType::WonByRuns);
        assert_eq!(result.margin_runs, Some(10));
        assert_eq!(result.winner_id.as_deref(), Some("lions"));
        assert_eq!(result.summary_text, "Lions won by 10 runs");
    }

    #[test]
    fn chasing_side_wins_by_wickets() {
        let entity = sample_match(
            Sport::Cricket,
            cricket(150, 8, "20"),
            cricket(151, 4, "18.3"),
        );
        let result = compute_result(&entity).unwrap();

        assert_eq!(result.result_type, ResultType::WonByWickets);
        assert_eq!(result.margin_wickets, Some(6));
        assert_eq!(result.winner_id.as_deref(), Some("tigers"));
        assert_eq!(result.summary_text, "Tigers won by 6 wickets");
    }

    #[test]
    fn batting_first_can_be_team2() {
        let mut entity = sample_match(
            Sport::Cricket,
            cricket(120, 2, "14.1"),
            cricket(119, 10, "20"),
        );
        entity
            .match_data
            .insert(BATTING_FIRST_KEY.into(), json!("team2"));
        let result = compute_result(&entity).unwrap();

        assert_eq!(result.result_type, ResultType::WonByWickets);
        assert_eq!(result.margin_wickets, Some(8));
        assert_eq!(result.winner_id.as_deref(), Some("lions"));
    }

    #[test]
    fn equal_runs_tie_without_winner() {
        let entity = sample_match(
            Sport::Cricket,
            cricket(160, 6, "20"),
            cricket(160, 9, "20"),
        );
        let result = compute_result(&entity).unwrap();

        assert_eq!(result.result_type, ResultType::Tie);
        assert_eq!(result.winner_id, None);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["winnerId"], Value::Null);
        assert_eq!(value["resultType"], "tie");
    }

    #[test]
    fn points_sports_win_or_draw() {
        let won = compute_result(&sample_match(
            Sport::Football,
            TeamScore::Points(1),
            TeamScore::Points(3),
        ))
        .unwrap();
        assert_eq!(won.result_type, ResultType::Won);
        assert_eq!(won.margin_points, Some(2));
        assert_eq!(won.winner_id.as_deref(), Some("tigers"));
        assert_eq!(won.summary_text, "Tigers won 3-1");

        let draw = compute_result(&sample_match(
            Sport::Kabaddi,
            TeamScore::Points(30),
            TeamScore::Points(30),
        ))
        .unwrap();
        assert_eq!(draw.result_type, ResultType::Draw);
        assert_eq!(draw.winner_id, None);
    }

    #[test]
    fn missing_score_cannot_complete() {
        let mut entity = sample_match(Sport::Tennis, TeamScore::Points(2), TeamScore::Points(1));
        entity.team2_score = None;
        assert!(matches!(
            compute_result(&entity),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn score_shape_must_match_sport() {
        assert!(validate_score(Sport::Cricket, TeamSide::Team1, &cricket(10, 1, "2.3")).is_ok());
        assert!(validate_score(Sport::Cricket, TeamSide::Team1, &TeamScore::Points(10)).is_err());
        assert!(validate_score(Sport::Volleyball, TeamSide::Team2, &TeamScore::Points(25)).is_ok());
        assert!(
            validate_score(Sport::Volleyball, TeamSide::Team2, &cricket(10, 1, "2")).is_err()
        );
        assert!(validate_score(Sport::Cricket, TeamSide::Team1, &cricket(10, 11, "2")).is_err());
        assert!(validate_score(Sport::Cricket, TeamSide::Team1, &cricket(10, 1, "2.6")).is_err());
    }

    #[test]
    fn match_data_merge_keeps_absent_keys_and_drops_nulls() {
        let mut data = IndexMap::new();
        data.insert("toss".to_string(), json!({"winner": "team1"}));
        data.insert("striker".to_string(), json!("Asha"));
        data.insert("bowler".to_string(), json!("Ravi"));

        let mut patch = IndexMap::new();
        patch.insert("striker".to_string(), json!("Meera"));
        patch.insert("bowler".to_string(), Value::Null);
        patch.insert("innings".to_string(), json!(1));
        merge_match_data(&mut data, patch);

        assert_eq!(data["toss"], json!({"winner": "team1"}));
        assert_eq!(data["striker"], json!("Meera"));
        assert_eq!(data["innings"], json!(1));
        assert!(!data.contains_key("bowler"));
    }
}
