//! FAST replay example.
//!
//! Decodes a captured FAST stream with a small market data template. With no
//! argument a synthetic stream is generated; otherwise the file named by the
//! first argument is replayed.
//!
//! Environment:
//! - `FAST_STRICT=1` enables strict presence-map validation
//! - `FAST_EMIT_NULLS=1` reports null optional fields
//! - `RUST_LOG=fastwire_decoder=trace` shows per-field decoding

use anyhow::Context;
use fastwire_decoder::{
    BufCursor, DecoderConfig, FastDecoder, FastEncoder, Field, FieldType, Operator,
    ScaledDecimal, Sequence, Template,
};
use std::env;
use tracing::{error, info};

/// Initializes logging for examples.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes"))
}

fn incremental_refresh() -> anyhow::Result<Template> {
    let entries = Sequence::new(
        Field::mandatory(268, FieldType::UInt32, Operator::None),
        vec![
            Field::mandatory(279, FieldType::UInt32, Operator::Copy)
                .with_initial_value(0u64)
                .into(),
            Field::mandatory(269, FieldType::Ascii, Operator::Copy).into(),
            Field::mandatory(270, FieldType::Decimal, Operator::Delta).into(),
            Field::optional(271, FieldType::Int32, Operator::Delta).into(),
        ],
    );

    Template::new(
        1,
        "MDIncRefresh",
        [
            Field::mandatory(35, FieldType::Ascii, Operator::Constant)
                .with_initial_value("X")
                .into(),
            Field::mandatory(34, FieldType::UInt32, Operator::Increment).into(),
            Field::mandatory(52, FieldType::UInt64, Operator::Delta).into(),
            Field::mandatory(55, FieldType::Ascii, Operator::Copy).into(),
            entries.into(),
        ],
    )
    .context("invalid template")
}

fn synthetic_stream() -> Vec<u8> {
    let mut encoder = FastEncoder::new();

    // tid, 34, 55 bits; two entries with bits for 279 and 269
    encoder
        .encode_bits(&[true, true, true])
        .encode_uint(1)
        .encode_uint(1)
        .encode_int(20_261_015_093_000_000)
        .encode_ascii("ESZ6")
        .encode_uint(2);
    encoder
        .encode_bits(&[false, true])
        .encode_ascii("0")
        .encode_decimal(ScaledDecimal::new(598_250, -2))
        .encode_nullable_int(Some(10));
    encoder
        .encode_bits(&[false, true])
        .encode_ascii("1")
        .encode_int(0)
        .encode_int(25)
        .encode_nullable_int(Some(5));

    // second message: template id, seq and symbol all carried forward
    encoder
        .encode_bits(&[false, false, false])
        .encode_int(1_500)
        .encode_uint(1);
    encoder
        .encode_bits(&[true, false])
        .encode_uint(1)
        .encode_int(0)
        .encode_int(-25)
        .encode_nullable_int(None);

    encoder.finish()
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = DecoderConfig::default()
        .with_strict_pmap(env_flag("FAST_STRICT"))
        .with_emit_null_fields(env_flag("FAST_EMIT_NULLS"));

    let data = match env::args().nth(1) {
        Some(path) => std::fs::read(&path).with_context(|| format!("reading {path}"))?,
        None => synthetic_stream(),
    };
    info!("Replaying {} bytes", data.len());

    let mut decoder = FastDecoder::with_config(config);
    decoder.register(incremental_refresh()?);

    let mut cursor = BufCursor::new(&data[..]);
    while !cursor.is_empty() {
        match decoder.decode(&mut cursor) {
            Ok(message) => {
                let fields: Vec<String> = message
                    .iter()
                    .map(|f| match &f.value {
                        Some(v) => format!("{}={v}", f.tag),
                        None => format!("{}=<null>", f.tag),
                    })
                    .collect();
                info!(
                    "Template {:?}: {}",
                    message.template_id(),
                    fields.join(" ")
                );
            }
            Err(e) => {
                error!("Decode error: {}", e);
                decoder.reset();
                break;
            }
        }
    }

    let stats = decoder.stats();
    info!(
        "Decoded {} messages, {} errors, {} presence map over-reads",
        stats.messages, stats.errors, stats.pmap_overruns
    );
    Ok(())
}
