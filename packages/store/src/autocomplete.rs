//! Debounced address autocomplete on top of [`OutageStore`].

use std::sync::Arc;
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::{MIN_SUGGESTION_CHARS, OutageStore};

/// Quiet period after the last keystroke before a suggestion request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Turns raw keystrokes into at most one suggestion request per pause.
///
/// Candidates land in the store's state ([`OutageStore::suggestions`]).
pub struct AddressAutocomplete {
    store: Arc<OutageStore>,
    debouncer: Debouncer,
}

impl AddressAutocomplete {
    #[must_use]
    pub fn new(store: Arc<OutageStore>) -> Self {
        Self::with_delay(store, DEFAULT_DEBOUNCE)
    }

    #[must_use]
    pub const fn with_delay(store: Arc<OutageStore>, delay: Duration) -> Self {
        Self {
            store,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Feeds the current input text.
    ///
    /// Short inputs clear the candidates immediately and cancel any pending
    /// request. Longer inputs schedule a fetch that replaces the previous
    /// scheduled one.
    pub fn input(&self, text: &str) {
        let text = text.trim().to_string();
        if text.chars().count() < MIN_SUGGESTION_CHARS {
            self.debouncer.cancel();
            self.store.clear_suggestions();
            return;
        }

        let store = Arc::clone(&self.store);
        self.debouncer.schedule(async move {
            store.fetch_address_suggestions(&text).await;
        });
    }

    /// Drops the pending request and the current candidates.
    pub fn reset(&self) {
        self.debouncer.cancel();
        self.store.clear_suggestions();
    }

    /// Waits until the pending request, if any, has landed in the store.
    pub async fn settle(&self) {
        self.debouncer.wait().await;
    }

    /// Whether a request is still waiting out the quiet period or running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use blackout_map_gateway::OutageGateway;
    use chrono::NaiveDate;

    use crate::MemoryDateStore;
    use crate::clock::FixedClock;
    use crate::fake::FakeGateway;

    fn setup() -> (Arc<FakeGateway>, AddressAutocomplete) {
        let gateway = Arc::new(FakeGateway::default());
        let now = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let store = Arc::new(OutageStore::with_clock(
            Arc::clone(&gateway) as Arc<dyn OutageGateway>,
            Arc::new(MemoryDateStore::default()),
            Arc::new(FixedClock(now)),
        ));
        (gateway, AddressAutocomplete::new(store))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_fires_one_request() {
        let (gateway, autocomplete) = setup();

        for text in ["Све", "Свет", "Светл", "Светла"] {
            autocomplete.input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(gateway.suggestion_requests().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(gateway.suggestion_requests(), ["Светла"]);
        assert_eq!(autocomplete.store.suggestions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_never_requests() {
        let (gateway, autocomplete) = setup();

        autocomplete.input("Св");
        autocomplete.input("  С ");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(gateway.suggestion_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shortening_input_cancels_pending_request() {
        let (gateway, autocomplete) = setup();

        autocomplete.input("Свет");
        tokio::time::sleep(Duration::from_millis(100)).await;
        autocomplete.input("Св");
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(gateway.suggestion_requests().is_empty());
        assert!(autocomplete.store.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_for_the_debounced_request() {
        let (gateway, autocomplete) = setup();

        autocomplete.input("Светланская 10");
        assert!(autocomplete.is_pending());
        autocomplete.settle().await;

        assert!(!autocomplete.is_pending());
        assert_eq!(gateway.suggestion_requests(), ["Светланская 10"]);
        assert_eq!(autocomplete.store.suggestions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_words_fire_per_pause() {
        let (gateway, autocomplete) = setup();

        autocomplete.input("Луго");
        tokio::time::sleep(Duration::from_millis(350)).await;
        autocomplete.input("Луговая");
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(gateway.suggestion_requests(), ["Луго", "Луговая"]);
    }
}
