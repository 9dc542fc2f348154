/// Venue booking requests and slot conflict checks.
pub mod booking_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match and team invitations redeemed through share links.
pub mod invitation_service;
/// Match creation, live scoring and lifecycle.
pub mod match_service;
/// Match and booking requests between users.
pub mod notification_service;
/// Sport-specific score validation and result computation.
pub mod scoring;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Per-match Server-Sent Events streams.
pub mod sse_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;

#[cfg(test)]
pub(crate) mod test_support;
