//! Synthetic single-net scenarios: one driving buffer at the origin and one
//! terminal sink `length` units away along the x axis.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const SINK_CAPACITANCE: f64 = 0.5;
pub const SINK_RAT: f64 = 200.0;

const SOURCE_NAME: &str = "buf1x";
const SINK_NAME: &str = "z0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "b")]
    Buffer,
    #[serde(rename = "t")]
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: u64,
    pub y: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub capacitance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: u32,
    pub segments: Vec<[u64; 2]>,
    pub vertices: [u32; 2],
}

/// Scenario document in the layout the tool reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub edge: Vec<Edge>,
    pub node: Vec<Node>,
}

impl TestCase {
    /// Builds the two-node net for `length`. The result depends on nothing else.
    #[must_use]
    pub fn for_length(length: u64) -> Self {
        let source = Node {
            id: 0,
            name: SOURCE_NAME.to_string(),
            kind: NodeKind::Buffer,
            x: 0,
            y: 0,
            capacitance: None,
            rat: None,
        };
        let sink = Node {
            id: 1,
            name: SINK_NAME.to_string(),
            kind: NodeKind::Terminal,
            x: length,
            y: 0,
            capacitance: Some(SINK_CAPACITANCE),
            rat: Some(SINK_RAT),
        };
        Self {
            edge: vec![Edge {
                id: 0,
                segments: vec![[0, 0], [length, 0]],
                vertices: [source.id, sink.id],
            }],
            node: vec![source, sink],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Scratch file a given length is written to. Distinct lengths never share a path.
#[must_use]
pub fn testcase_path(scratch_dir: &Path, length: u64) -> PathBuf {
    scratch_dir.join(format!("test{length}.json"))
}

/// Writes the scenario for `length` into `scratch_dir`, replacing any previous
/// file for the same length, and returns its path.
pub fn write_testcase(scratch_dir: &Path, length: u64) -> Result<PathBuf> {
    let path = testcase_path(scratch_dir, length);
    fs::write(&path, TestCase::for_length(length).to_json()?)?;
    log::trace!("wrote test case {}", path.display());
    Ok(path)
}
