//! Calculator Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the calculator controller.

pub mod calculator;

pub use calculator::*;
