// src/metrics/junit.rs

use std::path::Path;

use anyhow::{bail, Result};
use regex::Regex;

use super::{JunitSummary, MetricsParser, MetricsSummary};
use crate::fs::FileSystem;

/// Sums the count attributes of JUnit XML `<testsuite>` elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct JunitParser;

impl MetricsParser for JunitParser {
    fn parse(&self, path: &Path, fs: &dyn FileSystem) -> Result<MetricsSummary> {
        let xml = fs.read_to_string(path)?;
        Ok(MetricsSummary::Junit(summarize(&xml)?))
    }
}

fn summarize(xml: &str) -> Result<JunitSummary> {
    let suite_re = Regex::new(r"<testsuite\b([^>]*)>")?;
    let root_re = Regex::new(r"<testsuites\b([^>]*)>")?;
    let attr_re = Regex::new(r#"\b(tests|failures|errors|skipped)\s*=\s*["'](\d+)["']"#)?;

    let mut total = JunitSummary::default();
    let mut counted = false;
    for caps in suite_re.captures_iter(xml) {
        counted |= add_counts(&attr_re, &caps[1], &mut total);
    }

    // Some reporters only put totals on the root element.
    if !counted {
        if let Some(caps) = root_re.captures(xml) {
            counted = add_counts(&attr_re, &caps[1], &mut total);
        }
    }

    if !counted {
        bail!("no <testsuite> counts found");
    }
    Ok(total)
}

fn add_counts(attr_re: &Regex, attrs: &str, total: &mut JunitSummary) -> bool {
    let mut any = false;
    for caps in attr_re.captures_iter(attrs) {
        let Ok(n) = caps[2].parse::<u64>() else {
            continue;
        };
        any = true;
        match &caps[1] {
            "tests" => total.tests += n,
            "failures" => total.failures += n,
            "errors" => total.errors += n,
            "skipped" => total.skipped += n,
            _ => {}
        }
    }
    any
}
