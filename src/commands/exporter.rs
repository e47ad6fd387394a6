// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table, write_csv};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// A rendered table plus the structured records behind it.
pub struct Report<'a, T: Serialize> {
    pub headers: Vec<&'a str>,
    pub rows: Vec<Vec<String>>,
    pub records: &'a T,
    pub footer: Option<String>,
}

/// `--out` writes CSV, `--json`/`--jsonl` print the records, otherwise a
/// table is printed.
pub fn emit<T: Serialize>(sub: &clap::ArgMatches, report: Report<'_, T>) -> Result<()> {
    if let Some(out) = sub.get_one::<String>("out") {
        let path = Path::new(out.trim());
        write_csv(path, &report.headers, &report.rows)?;
        println!("Exported {} rows to {}", report.rows.len(), path.display());
        return Ok(());
    }
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if maybe_print_json(json_flag, jsonl_flag, report.records)? {
        return Ok(());
    }
    println!("{}", pretty_table(&report.headers, report.rows));
    if let Some(f) = report.footer {
        println!("{}", f);
    }
    Ok(())
}
