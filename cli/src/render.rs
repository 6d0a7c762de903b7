//! Human-readable output for the `txsim` commands.
//!
//! Every function writes to an `io::Write` so output can be checked in tests.

use serde_json::Value;
use std::io::{self, Write};

use txsim_core::{
    list_chains, DecodedCall, NftPreview, RiskWarning, SimulationResult, MAX_NFT_PREVIEWS,
};

pub const FOOTER: &str = "Uses Dune SIM API | Rate limits apply";

pub fn chains(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:<22} {:>12}", "Chain", "Chain ID")?;
    writeln!(out, "{}", "─".repeat(35))?;
    for entry in list_chains() {
        writeln!(out, "{:<22} {:>12}", entry.name, entry.chain_id)?;
    }
    Ok(())
}

pub fn decoded_call(out: &mut impl Write, decoded: &DecodedCall) -> io::Result<()> {
    match decoded {
        DecodedCall::Decoded(call) => {
            writeln!(out, "Function:  {}", call.function)?;
            writeln!(out, "Signature: {}", call.signature)?;
            writeln!(out, "Selector:  {}", call.selector_hex())?;
            if !call.params.is_empty() {
                writeln!(out, "Params:")?;
                for (name, val) in &call.params {
                    writeln!(out, "  {name}: {val}")?;
                }
            }
        }
        DecodedCall::Raw(raw) => {
            if let Some(failure) = &raw.failure {
                writeln!(out, "⚠️  Could not decode with the given ABI: {failure}")?;
            }
            writeln!(out, "Raw: {}", raw.data)?;
        }
    }
    Ok(())
}

/// Status, gas, balance changes, NFT previews and risks, in that order.
pub fn report(
    out: &mut impl Write,
    result: &SimulationResult,
    previews: &[NftPreview],
    risks: &[RiskWarning],
) -> io::Result<()> {
    writeln!(out, "📊 Results")?;
    let status = if result.success { "✅ Success" } else { "❌ Reverted" };
    writeln!(out, "  Status:   {status}")?;
    match result.gas_used {
        Some(gas) => writeln!(out, "  Gas Used: {gas}")?,
        None => writeln!(out, "  Gas Used: N/A")?,
    }

    if let Some(rows) = &result.balance_changes {
        writeln!(out)?;
        writeln!(out, "💸 Balance Changes")?;
        out.write_all(balance_table(rows).as_bytes())?;
    }

    if !previews.is_empty() {
        writeln!(out)?;
        writeln!(out, "🖼️  NFT Transfers")?;
        for preview in previews.iter().take(MAX_NFT_PREVIEWS) {
            let t = &preview.transfer;
            match &preview.image {
                Some(img) => writeln!(
                    out,
                    "  Token #{}  {}  [{} image, {} bytes]",
                    t.token_id, t.contract_address, img.format, img.len()
                )?,
                None => writeln!(out, "  Token #{}  {}", t.token_id, t.contract_address)?,
            }
        }
    }

    if !risks.is_empty() {
        writeln!(out)?;
        writeln!(out, "🚨 Risks")?;
        for risk in risks {
            let icon = match risk {
                RiskWarning::HighGas { .. } => "⚠️ ",
                RiskWarning::NewApprovals { .. } => "🔓",
            };
            writeln!(out, "  {icon} {risk}")?;
        }
    }
    Ok(())
}

pub fn footer(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(40))?;
    writeln!(out, "{FOOTER}")
}

/// Render balance change rows as a text table.
///
/// Columns are the union of object keys in first-seen order; rows that are
/// not objects go in a single `value` column.
pub fn balance_table(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Object(map) => {
                for k in map.keys() {
                    if !columns.contains(k) {
                        columns.push(k.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|c| c == "value") {
                    columns.push("value".to_string());
                }
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| match row {
                    Value::Object(map) => map.get(col).map(cell).unwrap_or_default(),
                    other if col == "value" => cell(other),
                    _ => String::new(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut table = String::new();
    push_row(&mut table, &columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut table, &rule, &widths);
    for row in &cells {
        push_row(&mut table, row, &widths);
    }
    table
}

fn push_row(table: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect();
    table.push_str("  ");
    table.push_str(padded.join("  ").trim_end());
    table.push('\n');
}

fn cell(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `{contract}_{token_id}.{ext}`, with path separators stripped from the id.
pub fn image_file_name(preview: &NftPreview) -> Option<String> {
    let img = preview.image.as_ref()?;
    let token: String = preview
        .transfer
        .token_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    Some(format!(
        "{}_{}.{}",
        preview.transfer.contract_address,
        token,
        img.format.extension()
    ))
}
