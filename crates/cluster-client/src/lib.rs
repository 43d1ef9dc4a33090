//! Cluster Store Client
//!
//! Typed access to the two kinds of object the calculator controller reads
//! and writes: `Calculator` custom resources and their dependent `Secret`s.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, ClusterError, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::new(kube::Client::try_default().await?);
//!
//! match client.get_calculator("default", "my-calc").await {
//!     Ok(calc) => println!("x={} y={}", calc.spec.x, calc.spec.y),
//!     Err(ClusterError::NotFound(_)) => println!("gone"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **test-util**: exposes `MockClusterClient`, an in-memory store with
//!   resource-version checking and failure injection

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
#[cfg(feature = "test-util")]
pub use mock::{MockClusterClient, MockOperation};
