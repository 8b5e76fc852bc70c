use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::scoring::ScoredLine;

/// The four parallel files written for one ranked group.
pub struct GroupWriters {
    pub pred: BufWriter<File>,
    pub src: BufWriter<File>,
    pub reference: BufWriter<File>,
    pub idx: BufWriter<File>,
}

pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Creating output file {:?}", path))?;
    Ok(BufWriter::new(file))
}

impl GroupWriters {
    pub fn create(pred: &Path, src: &Path, reference: &Path, idx: &Path) -> Result<Self> {
        Ok(Self {
            pred: create_output(pred)?,
            src: create_output(src)?,
            reference: create_output(reference)?,
            idx: create_output(idx)?,
        })
    }

    pub fn write_group(&mut self, lines: &[ScoredLine]) -> Result<()> {
        for line in lines {
            writeln!(self.src, "{}", line.src)?;
            writeln!(self.pred, "{}", line.hyp)?;
            writeln!(self.reference, "{}", line.reference)?;
            writeln!(self.idx, "{},{}", line.index, format_distance(line.distance))?;
        }
        self.pred.flush()?;
        self.src.flush()?;
        self.reference.flush()?;
        self.idx.flush()?;
        Ok(())
    }
}

/// Rewrites Rust's `1.5e-5` exponent as `1.5e-05`: explicit sign, at least two digits.
fn exponent_form(mantissa: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
}

fn split_exponent(sci: &str) -> (&str, i32) {
    match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (sci, 0),
    }
}

/// Shortest round-trip form, with a fractional part even for whole numbers.
/// Magnitudes below 1e-4 or from 1e16 up switch to exponent form.
pub fn format_distance(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{value:e}");
        let (mantissa, exp) = split_exponent(&sci);
        return exponent_form(mantissa, exp);
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `value` with `digits` significant digits, trailing zeros removed.
/// Fixed-point output keeps one fractional digit; exponents below -4 or of at
/// least `digits` use exponent form.
pub fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if value == 0.0 || !value.is_finite() {
        return format!("{value:.1}");
    }
    let sci = format!("{value:.prec$e}", prec = digits - 1);
    let (mantissa, exp) = split_exponent(&sci);

    if exp < -4 || exp >= digits as i32 {
        let mantissa = if mantissa.contains('.') {
            mantissa.trim_end_matches('0').trim_end_matches('.')
        } else {
            mantissa
        };
        return exponent_form(mantissa, exp);
    }

    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    let mut out = format!("{value:.decimals$}");
    if out.contains('.') {
        let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
        out.truncate(trimmed);
    }
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// HTML summary of a comparison run.
pub struct HtmlReport {
    css: String,
    body: Vec<String>,
}

impl HtmlReport {
    pub fn new(css: &str) -> Self {
        Self { css: css.to_string(), body: Vec::new() }
    }

    pub fn element(&mut self, tag: &str, text: &str) {
        self.body.push(format!("<{tag}>{}</{tag}>", escape_html(text)));
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(out, "<meta charset=\"utf-8\"/>")?;
        writeln!(
            out,
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
            escape_html(&self.css)
        )?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        for line in &self.body {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")?;
        out.flush()
    }
}

/// Renders the aggregate report into `out`.
pub fn write_report<W: Write + ?Sized>(out: &mut W, css: &str, average: f64) -> io::Result<()> {
    let mut report = HtmlReport::new(css);
    report.element("h1", "Distance");
    report.element(
        "p",
        &format!(
            "average edit distance (using the Ratcliff-Obershelp algorithm): {}",
            format_significant(average, 3)
        ),
    );
    report.write_to(out)
}
