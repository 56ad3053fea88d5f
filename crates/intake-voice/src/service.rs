use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{CreateRoomOptions, RoomClient};
use livekit_protocol::Room;
use std::time::Duration;

/// Room metadata attached to every intake call room, read by the agent
/// dispatcher to decide which agent joins.
const INTAKE_ROOM_METADATA: &str = r#"{"agent_name":"patient-intake-agent"}"#;

/// Maximum participants in an intake room: the patient, the agent, and a
/// little headroom for a supervisor listening in.
const INTAKE_ROOM_MAX_PARTICIPANTS: u32 = 10;

/// Issues access grants for real-time intake rooms and administers the rooms
/// themselves.
///
/// One room exists per active call; the patient joins with a
/// publish/subscribe grant and the intake agent joins with the same. Room
/// creation uses a separate administrative grant.
#[derive(Debug)]
pub struct RoomService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl RoomService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    /// Whether a LiveKit deployment is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty()
    }

    /// Issues a join token for a participant in a call room.
    pub fn participant_token(
        &self,
        room_name: &str,
        identity: &str,
        display_name: &str,
    ) -> Result<String, VoiceError> {
        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(display_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }

    /// Creates (or re-confirms) the room for one intake call. The room
    /// client signs each request with an administrative grant derived from
    /// the API key and secret.
    pub async fn create_call_room(&self, name: &str) -> Result<Room, VoiceError> {
        if !self.is_enabled() {
            return Err(VoiceError::Config(
                "LiveKit is not configured (livekit.url is empty)".to_string(),
            ));
        }

        let options = CreateRoomOptions {
            empty_timeout: self.config.room_empty_timeout,
            max_participants: INTAKE_ROOM_MAX_PARTICIPANTS,
            metadata: INTAKE_ROOM_METADATA.to_string(),
            ..Default::default()
        };

        self.room_client
            .create_room(name, options)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde_json::Value;

    fn service() -> RoomService {
        RoomService::new(LiveKitConfig::new(
            "ws://localhost:7880",
            "devkey",
            "devsecretdevsecretdevsecretdevsecret",
        ))
    }

    fn decode_claims(jwt: &str) -> Value {
        let key = DecodingKey::from_secret(b"devsecretdevsecretdevsecretdevsecret");
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Value>(jwt, &key, &validation).expect("token decodes").claims
    }

    #[test]
    fn participant_token_grants_join_on_the_call_room() {
        let jwt = service()
            .participant_token("phone-call-CA123", "caller-555", "Caller")
            .unwrap();
        let claims = decode_claims(&jwt);

        assert_eq!(claims["iss"], "devkey");
        assert_eq!(claims["sub"], "caller-555");
        assert_eq!(claims["video"]["room"], "phone-call-CA123");
        assert_eq!(claims["video"]["roomJoin"], true);
        assert_eq!(claims["video"]["canPublish"], true);
        assert_eq!(claims["video"]["canSubscribe"], true);
    }

    #[tokio::test]
    async fn create_room_requires_configuration() {
        let disabled = RoomService::new(LiveKitConfig::default());
        assert!(!disabled.is_enabled());
        let err = disabled.create_call_room("phone-call-x").await.unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }
}
