//! # HID Output Module
//!
//! USB HID gadget output: report layouts, the endpoint writer and the
//! [`OutputSink`](sink::OutputSink) trait the motion core drives.

pub mod gadget;
pub mod port_trait;
pub mod report;
pub mod sink;

pub use gadget::HidGadget;
