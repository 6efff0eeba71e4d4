//! Well-known code string values shared by every pipeline.

/// Consent flag value meaning the participant withdrew consent.
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

/// Control code for messages that could not be coded.
pub const NOT_CODED: &str = "NC";
pub const STOP: &str = "STOP";

/// Field carrying the consent flag on every traced record.
pub const CONSENT_WITHDRAWN_KEY: &str = "consent_withdrawn";
pub const PARTICIPANT_UUID_KEY: &str = "participant_uuid";

/// String values of codes marking a message as non-substantive.
pub const NON_RELEVANT_CODES: &[&str] = &[
    "showtime_question",
    "greeting",
    "opt_in",
    "about_conversation",
    "gratitude",
    "question",
    NOT_CODED,
];
