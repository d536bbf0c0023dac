pub mod capture_source;
pub mod frame_classifier;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use capture_source::{DeviceOpener, FrameSource, PcapOpener};
pub use frame_classifier::classify;
pub use metrics::{MetricsEngine, RunningMetrics};
pub use pipeline::{CapturePipeline, DeliveryEnd};
pub use types::{ClassifiedSegment, Delivery, Frame, PacketReport};
