//! Telephony webhook driver for the intake state machine.
//!
//! Each step of the conversation is one POST from the telephony platform
//! carrying the caller's last utterance (`SpeechResult`) or keypresses
//! (`Digits`) plus the call identifier (`CallSid`). Each response is a TwiML
//! document that speaks a confirmation and gathers the next field.
//!
//! Every field follows the same collect/retry pattern: empty input redirects
//! to the retry endpoint, the retry prompts once more, and a second empty
//! answer ends the call with an apology. Address collection additionally
//! loops on validation failure, bounded to one more attempt before the call
//! ends. All state between requests lives in the session store, keyed by
//! `CallSid` — consecutive steps of one call may be served by different
//! workers.

use crate::sessions::Conversation;
use crate::twiml::{GatherInput, Twiml};
use crate::AppState;
use axum::extract::{Extension, Form, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const GREETING: &str =
    "Hello! Thank you for calling. I'm here to help you schedule an appointment.";

const RETRY_PREFIX: &str = "I'm sorry, I didn't catch that.";

const TERMINAL_APOLOGY: &str =
    "I'm sorry, we seem to be having trouble hearing you. Please call back later. Goodbye.";

const ADDRESS_GIVE_UP: &str =
    "I'm sorry, we weren't able to verify your address. Please call our office directly to \
     complete your registration. Goodbye.";

const INTERNAL_APOLOGY: &str =
    "I apologize, something went wrong on our end. Please call back later. Goodbye.";

/// Form fields posted by the telephony platform on every webhook.
#[derive(Debug, Default, Deserialize)]
pub struct TelephonyForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,
}

impl TelephonyForm {
    /// The caller's input for this step: transcribed speech, or keypad
    /// digits when no transcription is present. Whitespace-only counts as
    /// empty.
    fn input(&self) -> Option<&str> {
        self.speech_result
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.digits
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
    }
}

/// Query string on collect endpoints: which attempt this is (1 or 2).
#[derive(Debug, Deserialize)]
pub struct AttemptQuery {
    #[serde(default = "default_attempt")]
    pub attempt: u8,
}

fn default_attempt() -> u8 {
    1
}

/// The collectible steps of the telephony flow, in order. Insurance and
/// contact are split across two gathers each (payer/ID, phone/email), and
/// the referral physician is asked only after an affirmative referral
/// answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Name,
    Dob,
    InsurancePayer,
    InsuranceId,
    Referral,
    ReferralPhysician,
    Complaint,
    Address,
    Phone,
    Email,
    Appointment,
}

impl Step {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Dob => "dob",
            Self::InsurancePayer => "insurance-payer",
            Self::InsuranceId => "insurance-id",
            Self::Referral => "referral",
            Self::ReferralPhysician => "referral-physician",
            Self::Complaint => "complaint",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Appointment => "appointment",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "name" => Some(Self::Name),
            "dob" => Some(Self::Dob),
            "insurance-payer" => Some(Self::InsurancePayer),
            "insurance-id" => Some(Self::InsuranceId),
            "referral" => Some(Self::Referral),
            "referral-physician" => Some(Self::ReferralPhysician),
            "complaint" => Some(Self::Complaint),
            "address" => Some(Self::Address),
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "appointment" => Some(Self::Appointment),
            _ => None,
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Self::Name => "May I have your full name, please?",
            Self::Dob => "What is your date of birth? Month, day, and year.",
            Self::InsurancePayer => "What is the name of your insurance provider?",
            Self::InsuranceId => {
                "What is your insurance member ID? You can say it or enter it on your keypad."
            }
            Self::Referral => {
                "Do you have a referral from another physician? \
                 Say yes or no, or press 1 for yes and 2 for no."
            }
            Self::ReferralPhysician => "What is the name of the referring physician?",
            Self::Complaint => "What is the reason for your visit today?",
            Self::Address => {
                "What is your complete mailing address, including street, city, state, \
                 and ZIP code?"
            }
            Self::Phone => {
                "What is the best phone number to reach you? Please enter it on your keypad."
            }
            Self::Email => {
                "Would you like to share an email address? Say it now, or say no to skip."
            }
            Self::Appointment => "To choose an appointment, enter its number on your keypad.",
        }
    }

    fn input_kind(self) -> GatherInput {
        match self {
            Self::Phone | Self::Appointment => GatherInput::Dtmf,
            Self::Referral | Self::Dob | Self::InsuranceId => GatherInput::SpeechDtmf,
            _ => GatherInput::Speech,
        }
    }

    fn collect_action(self, attempt: u8) -> String {
        if attempt > 1 {
            format!("/webhook/collect/{}?attempt={attempt}", self.slug())
        } else {
            format!("/webhook/collect/{}", self.slug())
        }
    }

    fn retry_action(self) -> String {
        format!("/webhook/retry/{}", self.slug())
    }
}

/// Handler for `POST /webhook/voice`: call entry.
///
/// Creates the conversation for this call and asks for the caller's name.
pub async fn voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<TelephonyForm>,
) -> Twiml {
    let Some(call_sid) = form.call_sid.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!("voice webhook without CallSid");
        return Twiml::new().say(INTERNAL_APOLOGY).hangup();
    };

    state.sessions.create(call_sid);
    tracing::info!(
        call_sid,
        from = form.from.as_deref().unwrap_or("unknown"),
        "incoming call"
    );

    ask(&state, Step::Name, Twiml::new().say(GREETING))
}

/// Handler for `POST /webhook/status`: call status callbacks.
///
/// Discards the conversation once the call reaches a terminal status.
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<TelephonyForm>,
) -> Json<Value> {
    let call_sid = form.call_sid.as_deref().unwrap_or("unknown");
    let call_status = form.call_status.as_deref().unwrap_or("unknown");
    tracing::info!(call_sid, call_status, "call status update");

    if matches!(
        call_status,
        "completed" | "failed" | "busy" | "no-answer" | "canceled"
    ) && state.sessions.remove(call_sid)
    {
        tracing::info!(call_sid, "conversation discarded after call end");
    }

    Json(json!({ "status": "ok" }))
}

/// Handler for `POST /webhook/collect/{step}`.
pub async fn collect_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(step_slug): Path<String>,
    Query(query): Query<AttemptQuery>,
    Form(form): Form<TelephonyForm>,
) -> Twiml {
    let Some(step) = Step::from_slug(&step_slug) else {
        tracing::warn!(step = step_slug, "unknown collect step");
        return Twiml::new().say(INTERNAL_APOLOGY).hangup();
    };

    let Some(call_sid) = form.call_sid.as_deref().filter(|s| !s.is_empty()) else {
        return Twiml::new().say(INTERNAL_APOLOGY).hangup();
    };

    let Some(conversation) = state.sessions.get(call_sid) else {
        tracing::warn!(call_sid, "collect webhook for unknown call");
        return Twiml::new().say(INTERNAL_APOLOGY).hangup();
    };

    let Some(input) = form.input() else {
        // Nothing heard. One retry, then end the call.
        if query.attempt >= 2 {
            state.sessions.remove(call_sid);
            return Twiml::new().say(TERMINAL_APOLOGY).hangup();
        }
        return Twiml::new().redirect(&step.retry_action());
    };

    let mut guard = conversation.lock().await;
    let twiml = apply_step(&state, &mut guard, step, input, query.attempt).await;
    drop(guard);

    if twiml.terminates() {
        state.sessions.remove(call_sid);
    }
    twiml
}

/// Handler for `POST /webhook/retry/{step}`.
///
/// One more gather for the same step; silence after this falls through to
/// the terminal apology.
pub async fn retry_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(step_slug): Path<String>,
) -> Twiml {
    let Some(step) = Step::from_slug(&step_slug) else {
        tracing::warn!(step = step_slug, "unknown retry step");
        return Twiml::new().say(INTERNAL_APOLOGY).hangup();
    };

    Twiml::new()
        .say(RETRY_PREFIX)
        .gather(
            step.input_kind(),
            &step.collect_action(2),
            state.gather_timeout_secs,
            step.prompt(),
        )
        .say(TERMINAL_APOLOGY)
        .hangup()
}

/// Applies the caller's input for `step` and builds the next instruction.
async fn apply_step(
    state: &AppState,
    conversation: &mut Conversation,
    step: Step,
    input: &str,
    attempt: u8,
) -> Twiml {
    match step {
        Step::Name => {
            let reply = conversation.intake.submit_name(input);
            ask(state, Step::Dob, Twiml::new().say(&reply))
        }
        Step::Dob => {
            let reply = conversation.intake.submit_dob(input);
            ask(state, Step::InsurancePayer, Twiml::new().say(&reply))
        }
        Step::InsurancePayer => {
            conversation.pending_payer = Some(input.to_string());
            ask(state, Step::InsuranceId, Twiml::new().say("Got it."))
        }
        Step::InsuranceId => {
            let payer = conversation.pending_payer.take().unwrap_or_default();
            let reply = conversation.intake.submit_insurance(&payer, input);
            ask(state, Step::Referral, Twiml::new().say(&reply))
        }
        Step::Referral => match parse_yes_no(input) {
            Some(true) => ask(state, Step::ReferralPhysician, Twiml::new()),
            Some(false) => {
                let reply = conversation.intake.submit_referral(false, None);
                ask(state, Step::Complaint, Twiml::new().say(&reply))
            }
            None if attempt >= 2 => Twiml::new().say(TERMINAL_APOLOGY).hangup(),
            None => Twiml::new().redirect(&Step::Referral.retry_action()),
        },
        Step::ReferralPhysician => {
            let reply = conversation.intake.submit_referral(true, Some(input));
            ask(state, Step::Complaint, Twiml::new().say(&reply))
        }
        Step::Complaint => {
            let reply = conversation.intake.submit_complaint(input);
            ask(state, Step::Address, Twiml::new().say(&reply))
        }
        Step::Address => {
            let reply = conversation.intake.submit_address(input);
            if conversation.intake.record().address_valid {
                ask(state, Step::Phone, Twiml::new().say(&reply))
            } else {
                conversation.address_attempts += 1;
                if conversation.address_attempts >= 2 {
                    Twiml::new().say(ADDRESS_GIVE_UP).hangup()
                } else {
                    // The rejection message already names the missing parts;
                    // gather the corrected address at the same step.
                    Twiml::new()
                        .gather(
                            Step::Address.input_kind(),
                            &Step::Address.collect_action(1),
                            state.gather_timeout_secs,
                            &reply,
                        )
                        .redirect(&Step::Address.retry_action())
                }
            }
        }
        Step::Phone => {
            conversation.pending_phone = Some(input.to_string());
            ask(state, Step::Email, Twiml::new().say("Thank you."))
        }
        Step::Email => {
            let phone = conversation.pending_phone.take().unwrap_or_default();
            let email = if declines_email(input) { None } else { Some(input) };
            let reply = conversation.intake.submit_contact(&phone, email);

            let listing = conversation
                .intake
                .list_appointments(state.notifier.as_ref())
                .await;

            Twiml::new()
                .say(&reply)
                .gather(
                    Step::Appointment.input_kind(),
                    &Step::Appointment.collect_action(1),
                    state.gather_timeout_secs,
                    &format!("{listing}\n{}", Step::Appointment.prompt()),
                )
                .redirect(&Step::Appointment.retry_action())
        }
        Step::Appointment => {
            let choice = input.trim().parse::<usize>().ok();
            match choice.and_then(|n| conversation.intake.select_appointment(n)) {
                Some(reply) => Twiml::new()
                    .say(&reply)
                    .say("Thank you for calling. Goodbye.")
                    .hangup(),
                None if attempt >= 2 => Twiml::new()
                    .say(
                        "No problem. Our scheduling team will contact you to pick a time. \
                         Thank you for calling. Goodbye.",
                    )
                    .hangup(),
                None => Twiml::new().redirect(&Step::Appointment.retry_action()),
            }
        }
    }
}

/// Appends a gather for `step` (and its silence fallback) to `twiml`.
fn ask(state: &AppState, step: Step, twiml: Twiml) -> Twiml {
    twiml
        .gather(
            step.input_kind(),
            &step.collect_action(1),
            state.gather_timeout_secs,
            step.prompt(),
        )
        .redirect(&step.retry_action())
}

fn parse_yes_no(input: &str) -> Option<bool> {
    let lowered = input.trim().to_lowercase();
    if lowered == "1" || lowered.starts_with("yes") || lowered == "yeah" || lowered == "yep" {
        Some(true)
    } else if lowered == "2" || lowered.starts_with("no") {
        Some(false)
    } else {
        None
    }
}

fn declines_email(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    matches!(lowered.as_str(), "no" | "nope" | "skip" | "none" | "no thanks" | "no thank you")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_slugs_round_trip() {
        for step in [
            Step::Name,
            Step::Dob,
            Step::InsurancePayer,
            Step::InsuranceId,
            Step::Referral,
            Step::ReferralPhysician,
            Step::Complaint,
            Step::Address,
            Step::Phone,
            Step::Email,
            Step::Appointment,
        ] {
            assert_eq!(Step::from_slug(step.slug()), Some(step));
        }
        assert_eq!(Step::from_slug("fax"), None);
    }

    #[test]
    fn speech_takes_precedence_over_digits() {
        let form = TelephonyForm {
            speech_result: Some("Jane Doe".into()),
            digits: Some("123".into()),
            ..Default::default()
        };
        assert_eq!(form.input(), Some("Jane Doe"));

        let blank = TelephonyForm {
            speech_result: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.input(), None);
    }

    #[test]
    fn yes_no_parsing_accepts_digits_and_words() {
        assert_eq!(parse_yes_no("1"), Some(true));
        assert_eq!(parse_yes_no("Yes, I do"), Some(true));
        assert_eq!(parse_yes_no("2"), Some(false));
        assert_eq!(parse_yes_no("No"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }

    #[test]
    fn email_decline_words() {
        assert!(declines_email("no"));
        assert!(declines_email("  Skip "));
        assert!(!declines_email("jane@example.com"));
    }
}
