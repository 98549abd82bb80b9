//! `--field key=value` arguments for the contact subcommand.

use anyhow::{anyhow, Context};
use site_shared::domain::FieldKey;

pub fn parse_field_assignment(raw: &str) -> anyhow::Result<(FieldKey, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("field '{raw}' must look like key=value"))?;
    let key = key
        .parse::<FieldKey>()
        .with_context(|| format!("invalid field assignment '{raw}'"))?;
    Ok((key, value.to_string()))
}
