//! Plain-text reports over a finished run.
//!
//! Every report starts with `#`-prefixed header lines followed by one
//! whitespace-separated record per line, ready for gnuplot and friends.

use std::io::{self, Write};

use dissim_core::ChannelId;

use crate::deterministic::{EventLog, Reception, SimulationReport};

/// Activations closer together than this are counted at the same instant.
const LEADER_TIME_EPSILON: f64 = 1e-8;

/// Writes the number of receptions on every channel.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn write_receptions_per_channel<W: Write>(log: &EventLog, out: &mut W) -> io::Result<()> {
    writeln!(out, "# Total receptions per channel")?;
    writeln!(out, "# <channel> <count>")?;
    write_counts(log.receptions(), out)
}

/// Writes the number of backlog clients served on every channel.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn write_client_receptions_per_channel<W: Write>(
    log: &EventLog,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "# Client receptions per channel")?;
    writeln!(out, "# <channel> <count>")?;
    write_counts(log.client_receptions(), out)
}

/// Lists channels `1..=max` seen, including idle ones.
fn write_counts<W: Write>(receptions: &[Reception], out: &mut W) -> io::Result<()> {
    let max_channel = receptions
        .iter()
        .map(|reception| reception.channel)
        .max()
        .unwrap_or(ChannelId::new(0));

    let mut counts = vec![0usize; max_channel.index() + 1];
    for reception in receptions {
        counts[reception.channel.index()] += 1;
    }

    for (channel, count) in counts.iter().enumerate().skip(1) {
        writeln!(out, "{channel} {count}")?;
    }
    Ok(())
}

/// Most boundary lines the bucketed CDF will write for one run.
pub const MAX_BUCKETS: f64 = 1_000_000.0;

/// Checks that `bucket_width` can sample a CDF.
///
/// # Errors
///
/// - `io::ErrorKind::InvalidInput` - `bucket_width` is not finite and positive
pub fn check_bucket_width(bucket_width: f64) -> io::Result<()> {
    if !bucket_width.is_finite() || bucket_width <= 0.0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("bucket width must be finite and positive, got {bucket_width}"),
        ));
    }
    Ok(())
}

/// Writes the reception CDF sampled at multiples of `bucket_width`.
///
/// Emits the fraction received before each crossed bucket boundary, then
/// the time of the last reception with the final fraction.
///
/// # Errors
///
/// - `io::ErrorKind::InvalidInput` - `bucket_width` is not finite and positive,
///   or would need more than [`MAX_BUCKETS`] boundaries to reach the last reception
/// - Any error raised by `out`
pub fn write_receptions_bucketed<W: Write>(
    log: &EventLog,
    bucket_width: f64,
    out: &mut W,
) -> io::Result<()> {
    check_bucket_width(bucket_width)?;
    if let Some(last) = log.receptions().last() {
        let buckets = (last.time.as_f64() / bucket_width).ceil();
        if buckets > MAX_BUCKETS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "bucket width {bucket_width} needs {buckets} buckets to reach {}, more than {MAX_BUCKETS}",
                    last.time
                ),
            ));
        }
    }

    writeln!(out, "# Reception CDF")?;
    writeln!(out, "# <time> <fraction received>")?;

    let receptions = log.receptions();
    let Some(first) = receptions.first() else {
        return Ok(());
    };

    let total = receptions.len() as f64;
    let mut current_time = first.time.as_f64();
    let mut current_fraction = 0.0;
    let mut boundary = bucket_width;

    for (i, reception) in receptions.iter().enumerate() {
        let time = reception.time.as_f64();
        while time > boundary {
            writeln!(out, "{boundary:?} {current_fraction:?}")?;
            boundary += bucket_width;
        }
        current_fraction = (i + 1) as f64 / total;
        current_time = time;
    }
    writeln!(out, "{current_time:?} {current_fraction:?}")
}

/// Writes the cumulative number of leaders at every distinct activation time.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn write_leader_count_over_time<W: Write>(log: &EventLog, out: &mut W) -> io::Result<()> {
    writeln!(out, "# Leader count vs. time")?;

    let activations = log.leader_activations();
    if activations.is_empty() {
        return Ok(());
    }

    let mut current_time = 0.0;
    let mut count = 0usize;
    for activation in activations {
        let time = activation.time.as_f64();
        if time - current_time > LEADER_TIME_EPSILON {
            writeln!(out, "{current_time:?} {count}")?;
        }
        count += 1;
        current_time = time;
    }
    writeln!(out, "{current_time:?} {count}")
}

/// Writes the whole report as pretty-printed JSON.
///
/// # Errors
///
/// Returns any error raised by `out` or by serialization.
pub fn write_json_report<W: Write>(report: &SimulationReport, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).map_err(io::Error::from)?;
    writeln!(out)
}
