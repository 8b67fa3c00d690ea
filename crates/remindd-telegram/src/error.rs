use teloxide::{ApiError, RequestError};

use remindd_core::DeliveryFailure;

/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] RequestError),

    #[error("no bot token configured")]
    NoToken,
}

/// Bucket a Telegram error into permanent vs transient.
///
/// Permanent means the destination can never succeed without the user
/// acting (unblocking the bot, restoring the chat). Everything else —
/// rate limits, transport errors, decode problems — is worth retrying,
/// and so is anything we fail to recognise.
pub fn classify(err: &RequestError) -> DeliveryFailure {
    match err {
        RequestError::Api(api) => classify_api(api),
        other => DeliveryFailure::Transient(other.to_string()),
    }
}

fn classify_api(api: &ApiError) -> DeliveryFailure {
    match api {
        ApiError::BotBlocked
        | ApiError::ChatNotFound
        | ApiError::UserDeactivated
        | ApiError::CantInitiateConversation
        | ApiError::CantTalkWithBots
        | ApiError::BotKicked
        | ApiError::BotKickedFromSupergroup
        | ApiError::GroupDeactivated
        | ApiError::InvalidUserId => DeliveryFailure::Permanent(api.to_string()),

        // Telegram reports plenty of errors only as free text; probe the
        // message for the unreachable-destination phrasings.
        ApiError::Unknown(text) => {
            let lower = text.to_lowercase();
            if lower.contains("blocked") || lower.contains("chat not found") {
                DeliveryFailure::Permanent(text.clone())
            } else {
                DeliveryFailure::Transient(text.clone())
            }
        }

        other => DeliveryFailure::Transient(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(err: ApiError) -> RequestError {
        RequestError::Api(err)
    }

    #[test]
    fn unreachable_destinations_are_permanent() {
        for err in [
            ApiError::BotBlocked,
            ApiError::ChatNotFound,
            ApiError::UserDeactivated,
            ApiError::CantInitiateConversation,
            ApiError::BotKicked,
            ApiError::GroupDeactivated,
            ApiError::InvalidUserId,
        ] {
            assert!(classify(&api(err)).is_permanent());
        }
    }

    #[test]
    fn unknown_text_is_probed_for_blocked_phrasings() {
        let blocked = api(ApiError::Unknown("Forbidden: bot was blocked by the user".into()));
        assert!(classify(&blocked).is_permanent());

        let missing = api(ApiError::Unknown("Bad Request: chat not found".into()));
        assert!(classify(&missing).is_permanent());

        let flood = api(ApiError::Unknown("Too Many Requests: retry later".into()));
        assert!(!classify(&flood).is_permanent());
    }

    #[test]
    fn unclassified_api_errors_default_to_transient() {
        assert!(!classify(&api(ApiError::MessageTextIsEmpty)).is_permanent());
        assert!(!classify(&api(ApiError::CantParseEntities("bad offset".into()))).is_permanent());
    }
}
