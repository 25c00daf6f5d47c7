//! Host-side collection buffer for guest-emitted figures.
//!
//! The run orchestrator arms a fresh [`ArtifactSink`] for every run and the
//! executor replays guest emissions into it, in order. An emission arriving
//! while the sink is not armed is a stray callback from a run that already
//! settled; it is dropped silently rather than raised.

use plotpad_core::ImageArtifact;

/// Collects the figures emitted during exactly one run.
#[derive(Debug)]
pub struct ArtifactSink {
    armed: bool,
    images: Vec<ImageArtifact>,
}

impl ArtifactSink {
    /// A new, unarmed sink.
    pub fn new() -> Self {
        Self {
            armed: false,
            images: Vec::new(),
        }
    }

    /// Start accepting emissions.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Whether the sink currently accepts emissions.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of figures collected so far.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no figures have been collected.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Accept one guest-emitted figure payload.
    ///
    /// Emissions on an unarmed sink and payloads that fail to parse are
    /// dropped; neither is an error the caller can act on.
    pub fn emit(&mut self, payload: &str) {
        if !self.armed {
            tracing::debug!("dropping figure emission outside an in-flight run");
            return;
        }
        match ImageArtifact::from_data_uri(payload) {
            Ok(image) => self.images.push(image),
            Err(err) => tracing::warn!(error = %err, "discarding malformed figure payload"),
        }
    }

    /// Disarm the sink and take the collected figures, in emission order.
    pub fn settle(&mut self) -> Vec<ImageArtifact> {
        self.armed = false;
        std::mem::take(&mut self.images)
    }
}

impl Default for ArtifactSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn armed_sink() -> ArtifactSink {
        let mut sink = ArtifactSink::new();
        sink.arm();
        sink
    }

    #[test]
    fn test_emissions_are_collected_in_call_order() {
        let mut sink = armed_sink();
        sink.emit("data:image/png;base64,QQ==");
        sink.emit("data:image/png;base64,Qg==");
        sink.emit("data:image/png;base64,Qw==");

        let images = sink.settle();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].data(), "QQ==");
        assert_eq!(images[1].data(), "Qg==");
        assert_eq!(images[2].data(), "Qw==");
    }

    #[test]
    fn test_unarmed_sink_drops_emissions() {
        let mut sink = ArtifactSink::new();
        sink.emit("data:image/png;base64,QQ==");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_settle_disarms_the_sink() {
        let mut sink = armed_sink();
        sink.emit("data:image/png;base64,QQ==");
        assert_eq!(sink.settle().len(), 1);

        assert!(!sink.is_armed());
        sink.emit("data:image/png;base64,Qg==");
        assert!(sink.settle().is_empty());
    }

    #[test]
    fn test_malformed_payloads_are_dropped_without_breaking_order() {
        let mut sink = armed_sink();
        sink.emit("data:image/png;base64,QQ==");
        sink.emit("not a data uri");
        sink.emit("data:image/png;base64,Qg==");

        let images = sink.settle();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].data(), "Qg==");
    }

    proptest! {
        #[test]
        fn prop_emission_order_is_preserved(payloads in proptest::collection::vec("[A-Za-z0-9+/]{1,64}", 0..32)) {
            let mut sink = armed_sink();
            for payload in &payloads {
                sink.emit(&format!("data:image/png;base64,{payload}"));
            }

            let images = sink.settle();
            prop_assert_eq!(images.len(), payloads.len());
            for (image, payload) in images.iter().zip(&payloads) {
                prop_assert_eq!(image.data(), payload.as_str());
            }
        }
    }
}
