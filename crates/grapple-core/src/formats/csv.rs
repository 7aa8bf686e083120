//! CSV edge lists, feature triplets and embedding tables.
//!
//! Input files may carry a header row (detected when the first field is not
//! an integer) and `#` comment lines.

use crate::{Error, FeatureMatrix, Graph, Result};
use ndarray::Array2;
use std::io::{Read, Write};

/// Edge list format: `u,v` or `u,v,weight`.
pub struct EdgeListCsv;

impl EdgeListCsv {
    /// Read a graph. Node count is `max id + 1`; unseen ids become isolated nodes.
    pub fn read<R: Read>(reader: R) -> Result<Graph> {
        let mut graph = Graph::new();
        for_each_record(reader, |line, fields| {
            if fields.len() < 2 {
                return Err(Error::Parse {
                    line,
                    message: format!("expected at least 2 columns, got {}", fields.len()),
                });
            }
            let u = parse_id(line, fields[0])?;
            let v = parse_id(line, fields[1])?;
            let w = match fields.get(2) {
                Some(raw) => parse_value(line, raw)?,
                None => 1.0,
            };
            graph.add_weighted_edge(u, v, w);
            Ok(())
        })?;
        Ok(graph)
    }

    /// Write `u,v,weight` rows (no header).
    pub fn write<W: Write>(graph: &Graph, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        for (u, v, w) in graph.edges() {
            wtr.write_record(&[u.to_string(), v.to_string(), w.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Feature triplets: `node,feature` or `node,feature,value`.
pub struct FeatureCsv;

impl FeatureCsv {
    /// Read a feature matrix with exactly `rows` rows.
    ///
    /// The column count is `max feature id + 1`.
    pub fn read<R: Read>(reader: R, rows: usize) -> Result<FeatureMatrix> {
        let mut triplets = Vec::new();
        for_each_record(reader, |line, fields| {
            if fields.len() < 2 {
                return Err(Error::Parse {
                    line,
                    message: format!("expected at least 2 columns, got {}", fields.len()),
                });
            }
            let node = parse_id(line, fields[0])?;
            let feature = parse_id(line, fields[1])?;
            let value = match fields.get(2) {
                Some(raw) => parse_value(line, raw)?,
                None => 1.0,
            };
            triplets.push((node, feature, value));
            Ok(())
        })?;
        let cols = triplets.iter().map(|&(_, c, _)| c + 1).max().unwrap_or(0);
        FeatureMatrix::from_triplets(rows, cols, triplets)
    }
}

/// Embedding table: header `id,x_0,...,x_{d-1}` then one row per node.
pub struct EmbeddingCsv;

impl EmbeddingCsv {
    pub fn write<W: Write>(embedding: &Array2<f64>, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["id".to_string()];
        header.extend((0..embedding.ncols()).map(|i| format!("x_{i}")));
        wtr.write_record(&header)?;

        for (node, row) in embedding.rows().into_iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(node.to_string());
            record.extend(row.iter().map(f64::to_string));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn for_each_record<R, F>(reader: R, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut first = true;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let fields: Vec<&str> = record.iter().collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        // Header row: first field is not a number at all
        if first && fields[0].parse::<f64>().is_err() {
            first = false;
            continue;
        }
        first = false;
        f(line, &fields)?;
    }
    Ok(())
}

fn parse_id(line: usize, raw: &str) -> Result<usize> {
    raw.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid node id {raw:?}"),
    })
}

fn parse_value(line: usize, raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid number {raw:?}"),
    })
}
