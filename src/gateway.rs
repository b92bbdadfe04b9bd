// ============================================================================
// REMOTE EDIT GATEWAY — boundary to the generative image service
// ============================================================================
//
// The core never talks to the network itself. The host hands the session
// controller an `EditGateway` implementation; everything behind it (HTTP,
// auth, quota, retries) is opaque. All failure causes collapse into one
// human-readable `GatewayError` — the controller logs it and surfaces it to
// the user, nothing more.

use futures::future::{BoxFuture, Either, select};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::io::ImageData;

/// Failure from the remote edit service. Network errors, quota rejections
/// and malformed responses are all treated identically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One edit call: the base image, the instruction, and a coarse aspect-ratio
/// hint (the service does not accept exact pixel dimensions).
#[derive(Debug, Clone, Copy)]
pub struct EditRequest<'a> {
    pub image: &'a ImageData,
    pub instruction: &'a str,
    pub aspect_ratio: AspectRatio,
}

/// Async capability: `edit(image, instruction, ratio) -> image | error`.
///
/// Returns a boxed future so the trait stays object-safe and the controller
/// can hold a `Box<dyn EditGateway>`.
pub trait EditGateway: Send + Sync {
    fn edit<'a>(
        &'a self,
        request: EditRequest<'a>,
    ) -> BoxFuture<'a, Result<ImageData, GatewayError>>;
}

impl<G: EditGateway + ?Sized> EditGateway for &G {
    fn edit<'a>(
        &'a self,
        request: EditRequest<'a>,
    ) -> BoxFuture<'a, Result<ImageData, GatewayError>> {
        (**self).edit(request)
    }
}

impl<G: EditGateway + ?Sized> EditGateway for std::sync::Arc<G> {
    fn edit<'a>(
        &'a self,
        request: EditRequest<'a>,
    ) -> BoxFuture<'a, Result<ImageData, GatewayError>> {
        (**self).edit(request)
    }
}

// ============================================================================
// ASPECT-RATIO BUCKETING
// ============================================================================

/// The fixed set of ratio hints the remote service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    Square,
    Portrait3x4,
    Landscape4x3,
    Portrait9x16,
    Landscape16x9,
}

impl AspectRatio {
    /// Scan order matters: ties between presets resolve to the first one
    /// visited with a strictly smaller difference.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    pub fn value(self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Portrait3x4 => 0.75,
            AspectRatio::Landscape4x3 => 4.0 / 3.0,
            AspectRatio::Portrait9x16 => 0.5625,
            AspectRatio::Landscape16x9 => 16.0 / 9.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    /// Pick the preset closest to `width / height` by absolute difference.
    pub fn closest(width: u32, height: u32) -> AspectRatio {
        if height == 0 {
            return AspectRatio::Square;
        }
        let ratio = width as f64 / height as f64;
        let mut best = AspectRatio::ALL[0];
        let mut best_diff = (best.value() - ratio).abs();
        for preset in &AspectRatio::ALL[1..] {
            let diff = (preset.value() - ratio).abs();
            if diff < best_diff {
                best = *preset;
                best_diff = diff;
            }
        }
        best
    }
}

// ============================================================================
// TIMEOUT DECORATOR
// ============================================================================

/// Sleep provider supplied by the host (e.g. `tokio::time::sleep`). Keeps
/// the core runtime-agnostic.
pub type SleepFn = Box<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps a gateway with a deadline. The core itself has no timeout policy —
/// a hung call would hold the session in `Processing` indefinitely — so
/// hosts that need one install this at the boundary.
pub struct TimeoutGateway<G> {
    inner: G,
    limit: Duration,
    sleep: SleepFn,
}

impl<G: EditGateway> TimeoutGateway<G> {
    pub fn new(inner: G, limit: Duration, sleep: SleepFn) -> Self {
        Self {
            inner,
            limit,
            sleep,
        }
    }
}

impl<G: EditGateway> EditGateway for TimeoutGateway<G> {
    fn edit<'a>(
        &'a self,
        request: EditRequest<'a>,
    ) -> BoxFuture<'a, Result<ImageData, GatewayError>> {
        Box::pin(async move {
            let call = self.inner.edit(request);
            let deadline = (self.sleep)(self.limit);
            match select(call, deadline).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => {
                    log::warn!("edit call exceeded {:?} deadline", self.limit);
                    Err(GatewayError::new(format!(
                        "The edit service did not respond within {} seconds.",
                        self.limit.as_secs()
                    )))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_hits_the_obvious_buckets() {
        assert_eq!(AspectRatio::closest(1000, 1000), AspectRatio::Square);
        assert_eq!(AspectRatio::closest(1920, 1080), AspectRatio::Landscape16x9);
        assert_eq!(AspectRatio::closest(1080, 1920), AspectRatio::Portrait9x16);
        assert_eq!(AspectRatio::closest(800, 600), AspectRatio::Landscape4x3);
        assert_eq!(AspectRatio::closest(768, 1024), AspectRatio::Portrait3x4);
    }

    #[test]
    fn exact_midpoint_keeps_the_first_scanned_preset() {
        // 0.875 sits exactly between 1:1 (1.0) and 3:4 (0.75). The scan
        // visits 1:1 first and 3:4 never gets strictly smaller, so 1:1 wins.
        assert_eq!(AspectRatio::closest(875, 1000), AspectRatio::Square);
    }

    #[test]
    fn zero_height_falls_back_to_square() {
        assert_eq!(AspectRatio::closest(640, 0), AspectRatio::Square);
    }

    struct HungGateway;

    impl EditGateway for HungGateway {
        fn edit<'a>(
            &'a self,
            _: EditRequest<'a>,
        ) -> BoxFuture<'a, Result<ImageData, GatewayError>> {
            Box::pin(futures::future::pending())
        }
    }

    #[tokio::test]
    async fn timeout_decorator_converts_a_hung_call_into_an_error() {
        let gateway = TimeoutGateway::new(
            HungGateway,
            Duration::from_secs(30),
            // Fires immediately so the test does not actually wait.
            Box::new(|_| Box::pin(futures::future::ready(()))),
        );
        let base = ImageData::new(vec![1, 2, 3], crate::io::MIME_PNG);
        let request = EditRequest {
            image: &base,
            instruction: "warm up the sky",
            aspect_ratio: AspectRatio::Square,
        };
        let err = gateway.edit(request).await.unwrap_err();
        assert!(err.message.contains("did not respond"));
    }
}
