//! File formats for graphs, features and estimator outputs.
//!
//! - CSV edge lists (`u,v[,weight]`) and feature triplets (`node,feature[,value]`)
//! - CSV embedding tables (`id,x_0,...`)
//! - JSON membership maps (`{"node": [community, ...]}`)

mod csv;
mod json;

pub use self::csv::{EdgeListCsv, EmbeddingCsv, FeatureCsv};
pub use self::json::MembershipJson;
