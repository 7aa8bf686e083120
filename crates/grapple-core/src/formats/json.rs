use crate::{Error, Memberships, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Membership map serialized as `{"<node>": [community, ...]}`.
///
/// Keys are strings because JSON object keys must be; readers accept any
/// key order but every node `0..n` must be present.
pub struct MembershipJson;

impl MembershipJson {
    pub fn write<W: Write>(memberships: &Memberships, writer: W) -> Result<()> {
        let map: BTreeMap<usize, &Vec<usize>> = memberships.as_slice().iter().enumerate().collect();
        serde_json::to_writer_pretty(writer, &map)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: R) -> Result<Memberships> {
        let map: BTreeMap<usize, Vec<usize>> = serde_json::from_reader(reader)?;
        let n = map.len();
        let mut assignments = vec![Vec::new(); n];
        for (node, comms) in map {
            if node >= n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    got: node + 1,
                });
            }
            assignments[node] = comms;
        }
        Ok(Memberships::from_overlapping(assignments))
    }
}
