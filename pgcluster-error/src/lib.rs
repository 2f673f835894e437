// Copyright 2023 The PgCluster Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # PgCluster Error Handling
//!
//! One error type, [`ClusterError`], shared by the parser, the cluster
//! directory, the lifecycle controller and the query executor.
//!
//! Every variant keeps the text an operator needs to diagnose a failure
//! without re-running anything: the command line (secrets redacted), the
//! statement, the offending output line and the captured stderr.
//!
//! ```rust
//! use pgcluster_error::ClusterError;
//! use pgcluster_error::ClusterResult;
//!
//! fn check_port(port: u16, taken: &[u16]) -> ClusterResult<()> {
//!     if taken.contains(&port) {
//!         return Err(ClusterError::port_in_use(port, "9.3/main"));
//!     }
//!     Ok(())
//! }
//! # check_port(5440, &[5432]).unwrap();
//! ```

mod cluster_error;

pub use cluster_error::ClusterError;
pub use cluster_error::ClusterResult;
