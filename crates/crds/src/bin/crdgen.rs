//! Prints the Calculator CRD manifest as YAML.
//!
//! ```sh
//! cargo run -p crds --bin crdgen > config/crd/calculators.yaml
//! ```

use crds::Calculator;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Calculator::crd())?);
    Ok(())
}
