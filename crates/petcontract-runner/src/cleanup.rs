//! Delete every tracked id and verify it is gone
//!
//! Best-effort across ids: a failure on one id is recorded and the next id is
//! still attempted.

use petcontract_core::{CleanupFailure, CleanupStage, ExpectedContract, Violation};
use serde_json::json;

use crate::api::PetApi;
use crate::checks::verify;

/// Message the API returns for an id that does not exist.
pub const NOT_FOUND_MESSAGE: &str = "Pet not found";

/// What happened to each id handed to cleanup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub cleaned: Vec<u64>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupOutcome {
    /// # Errors
    ///
    /// Returns every per-id failure.
    pub fn into_result(self) -> Result<Vec<u64>, Vec<CleanupFailure>> {
        if self.failures.is_empty() {
            Ok(self.cleaned)
        } else {
            Err(self.failures)
        }
    }
}

/// `DELETE` must answer 200; timing is not part of the cleanup contract.
fn delete_contract() -> ExpectedContract {
    ExpectedContract::status(200).with_max_duration_ms(u64::MAX)
}

/// A fetch after deletion must report not-found.
fn gone_contract() -> ExpectedContract {
    ExpectedContract::status(404)
        .with_field("message", json!(NOT_FOUND_MESSAGE))
        .with_max_duration_ms(u64::MAX)
}

fn transport_violation(err: &impl std::fmt::Display) -> Vec<Violation> {
    vec![Violation::new("transport", "response", err.to_string())]
}

/// Delete each id, then confirm a fetch reports it as not found.
pub fn cleanup(api: &PetApi<'_>, ids: &[u64]) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    for &id in ids {
        let deleted = match api.delete(id) {
            Ok(resp) => verify(&resp, &delete_contract()),
            Err(e) => Err(transport_violation(&e)),
        };
        if let Err(violations) = deleted {
            tracing::warn!(id, "delete failed");
            outcome.failures.push(CleanupFailure {
                id,
                stage: CleanupStage::Delete,
                violations,
            });
            continue;
        }

        let gone = match api.fetch(id) {
            Ok(resp) => verify(&resp, &gone_contract()),
            Err(e) => Err(transport_violation(&e)),
        };
        match gone {
            Ok(()) => {
                tracing::debug!(id, "deleted and verified");
                outcome.cleaned.push(id);
            }
            Err(violations) => {
                tracing::warn!(id, "still resolvable after delete");
                outcome.failures.push(CleanupFailure {
                    id,
                    stage: CleanupStage::Verify,
                    violations,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedTransport;
    use petcontract_core::HttpMethod;

    fn not_found() -> serde_json::Value {
        json!({"code": 1, "type": "error", "message": NOT_FOUND_MESSAGE})
    }

    #[test]
    fn deletes_and_verifies_each_id() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"code": 200, "message": "1"}))
            .reply(404, not_found())
            .reply(200, json!({"code": 200, "message": "2"}))
            .reply(404, not_found());
        let api = PetApi::new(&transport, "http://api.test/pet", "k");

        let outcome = cleanup(&api, &[1, 2]);
        assert_eq!(outcome.cleaned, vec![1, 2]);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            transport.sent(),
            vec![
                (HttpMethod::Delete, "http://api.test/pet/1".into()),
                (HttpMethod::Get, "http://api.test/pet/1".into()),
                (HttpMethod::Delete, "http://api.test/pet/2".into()),
                (HttpMethod::Get, "http://api.test/pet/2".into()),
            ]
        );
    }

    #[test]
    fn failed_delete_does_not_stop_batch() {
        let transport = ScriptedTransport::default()
            .reply(404, not_found())
            .reply(200, json!({"code": 200}))
            .reply(404, not_found());
        let api = PetApi::new(&transport, "http://api.test/pet", "k");

        let outcome = cleanup(&api, &[1, 2]);
        assert_eq!(outcome.cleaned, vec![2]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, 1);
        assert_eq!(outcome.failures[0].stage, CleanupStage::Delete);
        assert_eq!(outcome.failures[0].violations[0].field, "status");
    }

    #[test]
    fn still_present_after_delete_is_verify_failure() {
        let transport = ScriptedTransport::default()
            .reply(200, json!({"code": 200}))
            .reply(200, json!({"id": 5, "name": "doggie", "photoUrls": []}));
        let api = PetApi::new(&transport, "http://api.test/pet", "k");

        let failures = cleanup(&api, &[5]).into_result().unwrap_err();
        assert_eq!(failures[0].stage, CleanupStage::Verify);
        let fields: Vec<&str> = failures[0]
            .violations
            .iter()
            .map(|v| v.field.as_str())
            .collect();
        assert_eq!(fields, vec!["status", "message"]);
    }

    #[test]
    fn transport_error_recorded_per_id() {
        let transport = ScriptedTransport::default()
            .fail("connection reset")
            .reply(200, json!({"code": 200}))
            .reply(404, not_found());
        let api = PetApi::new(&transport, "http://api.test/pet", "k");

        let outcome = cleanup(&api, &[1, 2]);
        assert_eq!(outcome.failures[0].violations[0].field, "transport");
        assert_eq!(outcome.cleaned, vec![2]);
    }

    #[test]
    fn nothing_to_clean() {
        let transport = ScriptedTransport::default();
        let api = PetApi::new(&transport, "http://api.test/pet", "k");
        assert_eq!(cleanup(&api, &[]).into_result(), Ok(vec![]));
        assert!(transport.sent().is_empty());
    }
}
