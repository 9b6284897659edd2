//! Typed trial records
//!
//! [`TrialRecord::from_table`] resolves the column layout of one trial file
//! against the session's [`Pairing`] and keeps, per player slot:
//!
//! - **positions**: `{prefix}x`, `{prefix}z`
//! - **engagement indicators**: `{prefix}TA{j}` for every target, derived from
//!   `t{j}run` flags and positions when the file is a raw recording
//! - **engagement labels**: `{prefix}_engagement`, collapsed from the
//!   indicators when the column is absent
//!
//! Engagement files written for human-human and simulation sessions name the
//! herders by slot (`HA0`, `HA1`); those headers are accepted as aliases of
//! the herder in that slot.

use crate::{
    engagement::{self, Engagement, Frame, MAX_TARGETS, Position, TargetFlags},
    error::RecordError,
    herder::{Herder, Pairing, PlayerSlot},
    table::TrialTable,
    trial::TrialNumber,
};

/// Signals of one herder within a trial.
#[derive(Debug, Clone)]
pub struct HerderTrack {
    herder: Herder,
    positions: Option<Vec<Position>>,
    indicators: Option<Vec<TargetFlags>>,
    engagement: Option<Vec<Engagement>>,
}

impl HerderTrack {
    #[must_use]
    pub fn herder(&self) -> Herder {
        self.herder
    }
}

/// One trial of one session, with columns resolved to player slots.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    session: String,
    trial: TrialNumber,
    trial_id: Option<TrialNumber>,
    num_targets: usize,
    time: Option<Vec<f64>>,
    tracks: [HerderTrack; 2],
}

impl TrialRecord {
    /// Resolves a parsed trial file.
    ///
    /// `trial` is the trial the file was looked up for; the file's own
    /// `TrialID` column, when present, is kept separately for consistency
    /// checks.
    pub fn from_table(
        session: &str,
        trial: TrialNumber,
        pairing: Pairing,
        table: &TrialTable,
    ) -> Result<Self, RecordError> {
        let malformed = |reason: String| RecordError::MalformedTrialFile {
            session: session.to_owned(),
            trial,
            path: "<table>".into(),
            reason,
        };

        if table.num_rows() == 0 {
            return Err(malformed("file has no samples".to_owned()));
        }

        let trial_id = match table.column("TrialID").and_then(|c| c.first()) {
            Some(&value) => Some(
                as_count(value)
                    .and_then(|v| u32::try_from(v).ok())
                    .map(TrialNumber)
                    .ok_or_else(|| malformed(format!("invalid TrialID {value}")))?,
            ),
            None => None,
        };

        let num_targets = match table.column("numTargs").and_then(|c| c.first()) {
            Some(&value) => as_count(value)
                .filter(|n| (1..=MAX_TARGETS).contains(n))
                .ok_or_else(|| malformed(format!("invalid numTargs {value}")))?,
            None => (0..MAX_TARGETS)
                .take_while(|j| table.has_column(&format!("t{j}x")))
                .count(),
        };

        for column in numeric_columns(pairing, num_targets) {
            ensure_finite(table, &column).map_err(&malformed)?;
        }

        let raw_flags = derive_chase_flags(table, pairing, num_targets);
        let targets = target_positions(table, num_targets);

        let track = |slot: PlayerSlot| {
            resolve_track(
                table,
                pairing,
                slot,
                num_targets,
                raw_flags.as_ref().map(|flags| &flags[slot.index()]),
                targets.as_deref(),
            )
            .map_err(&malformed)
        };
        let tracks = [track(PlayerSlot::First)?, track(PlayerSlot::Second)?];

        Ok(Self {
            session: session.to_owned(),
            trial,
            trial_id,
            num_targets,
            time: table.column("time").map(<[f64]>::to_vec),
            tracks,
        })
    }

    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    #[must_use]
    pub fn trial(&self) -> TrialNumber {
        self.trial
    }

    /// Trial identifier recorded inside the file, if it has a `TrialID` column.
    #[must_use]
    pub fn trial_id(&self) -> Option<TrialNumber> {
        self.trial_id
    }

    #[must_use]
    pub fn num_targets(&self) -> usize {
        self.num_targets
    }

    #[must_use]
    pub fn herder(&self, slot: PlayerSlot) -> Herder {
        self.tracks[slot.index()].herder
    }

    pub fn time(&self) -> Result<&[f64], RecordError> {
        self.time.as_deref().ok_or_else(|| self.schema_mismatch("time"))
    }

    /// Planar trajectory of the herder in `slot`.
    pub fn positions(&self, slot: PlayerSlot) -> Result<&[Position], RecordError> {
        let track = &self.tracks[slot.index()];
        track
            .positions
            .as_deref()
            .ok_or_else(|| self.schema_mismatch(&format!("{}x", track.herder.prefix())))
    }

    /// Per-target engagement indicators of the herder in `slot`.
    pub fn indicators(&self, slot: PlayerSlot) -> Result<&[TargetFlags], RecordError> {
        let track = &self.tracks[slot.index()];
        track
            .indicators
            .as_deref()
            .ok_or_else(|| self.schema_mismatch(&format!("{}TA0", track.herder.prefix())))
    }

    /// Collapsed engagement labels of the herder in `slot`.
    pub fn engagement(&self, slot: PlayerSlot) -> Result<&[Engagement], RecordError> {
        let track = &self.tracks[slot.index()];
        track
            .engagement
            .as_deref()
            .ok_or_else(|| self.schema_mismatch(&format!("{}_engagement", track.herder.prefix())))
    }

    fn schema_mismatch(&self, column: &str) -> RecordError {
        RecordError::SchemaMismatch {
            session: self.session.clone(),
            trial: self.trial,
            column: column.to_owned(),
        }
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: f64) -> Option<usize> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as usize)
}

/// Column name candidates for the herder in `slot`: its own prefix, then the
/// slot alias.
fn prefixes(pairing: Pairing, slot: PlayerSlot) -> [String; 2] {
    [pairing.herder(slot).prefix(), format!("HA{}", slot.index())]
}

/// Position, running-flag and indicator columns a record may read numbers from.
fn numeric_columns(pairing: Pairing, num_targets: usize) -> Vec<String> {
    let mut columns = vec![];
    for j in 0..num_targets {
        columns.extend([format!("t{j}x"), format!("t{j}z"), format!("t{j}run")]);
    }
    for slot in PlayerSlot::ALL {
        for prefix in prefixes(pairing, slot) {
            columns.extend([format!("{prefix}x"), format!("{prefix}z")]);
            columns.extend((0..num_targets).map(|j| format!("{prefix}TA{j}")));
        }
    }
    columns
}

/// Empty or unparsable cells read as NaN; reject them where numbers are used.
fn ensure_finite(table: &TrialTable, column: &str) -> Result<(), String> {
    let Some(values) = table.column(column) else {
        return Ok(());
    };
    match values.iter().position(|v| !v.is_finite()) {
        Some(row) => Err(format!(
            "non-finite value in column '{column}' at row {}",
            row + 1
        )),
        None => Ok(()),
    }
}

fn column_pair<'a>(table: &'a TrialTable, prefix: &str) -> Option<(&'a [f64], &'a [f64])> {
    Some((
        table.column(&format!("{prefix}x"))?,
        table.column(&format!("{prefix}z"))?,
    ))
}

fn herder_positions(table: &TrialTable, prefix: &str) -> Option<Vec<Position>> {
    let (xs, zs) = column_pair(table, prefix)?;
    Some(
        xs.iter()
            .zip(zs)
            .map(|(&x, &z)| Position::new(x, z))
            .collect(),
    )
}

fn target_positions(table: &TrialTable, num_targets: usize) -> Option<Vec<Vec<Position>>> {
    let columns = (0..num_targets)
        .map(|j| column_pair(table, &format!("t{j}")))
        .collect::<Option<Vec<_>>>()?;
    Some(
        (0..table.num_rows())
            .map(|row| {
                columns
                    .iter()
                    .map(|(xs, zs)| Position::new(xs[row], zs[row]))
                    .collect()
            })
            .collect(),
    )
}

/// Derives chase flags for both slots from a raw recording, if it has the
/// running flags and all positions.
fn derive_chase_flags(
    table: &TrialTable,
    pairing: Pairing,
    num_targets: usize,
) -> Option<[Vec<TargetFlags>; 2]> {
    if num_targets == 0 {
        return None;
    }
    let running = (0..num_targets)
        .map(|j| table.column(&format!("t{j}run")))
        .collect::<Option<Vec<_>>>()?;
    let targets = target_positions(table, num_targets)?;
    let herders = [
        herder_positions(table, &pairing.herder(PlayerSlot::First).prefix())?,
        herder_positions(table, &pairing.herder(PlayerSlot::Second).prefix())?,
    ];

    let mut flags = [Vec::new(), Vec::new()];
    for (row, row_targets) in targets.iter().enumerate() {
        let row_running = running.iter().map(|c| c[row] != 0.0).collect::<Vec<_>>();
        let frame = Frame {
            running: &row_running,
            targets: row_targets,
            herders: [herders[0][row], herders[1][row]],
        };
        let [first, second] = engagement::chase_flags(&frame);
        flags[0].push(first);
        flags[1].push(second);
    }
    Some(flags)
}

fn indicator_columns(
    table: &TrialTable,
    prefix: &str,
    num_targets: usize,
) -> Option<Vec<TargetFlags>> {
    if num_targets == 0 {
        return None;
    }
    let columns = (0..num_targets)
        .map(|j| table.column(&format!("{prefix}TA{j}")))
        .collect::<Option<Vec<_>>>()?;
    Some(
        (0..table.num_rows())
            .map(|row| columns.iter().map(|c| c[row] != 0.0).collect())
            .collect(),
    )
}

fn resolve_track(
    table: &TrialTable,
    pairing: Pairing,
    slot: PlayerSlot,
    num_targets: usize,
    raw_flags: Option<&Vec<TargetFlags>>,
    target_positions: Option<&[Vec<Position>]>,
) -> Result<HerderTrack, String> {
    let herder = pairing.herder(slot);
    let [own, alias] = prefixes(pairing, slot);

    let positions = herder_positions(table, &own);

    let indicators = indicator_columns(table, &own, num_targets)
        .or_else(|| indicator_columns(table, &alias, num_targets))
        .or_else(|| raw_flags.cloned());

    let label_column = table
        .column(&format!("{own}_engagement"))
        .or_else(|| table.column(&format!("{alias}_engagement")));
    let engagement = match label_column {
        Some(labels) => Some(
            labels
                .iter()
                .map(|&label| {
                    Engagement::from_label(label)
                        .ok_or_else(|| format!("invalid engagement label {label} for {herder}"))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => match (&indicators, &positions, target_positions) {
            (Some(indicators), Some(positions), Some(targets)) => Some(
                indicators
                    .iter()
                    .zip(positions)
                    .zip(targets)
                    .map(|((flags, &herder), targets)| {
                        engagement::collapse(flags, herder, targets)
                    })
                    .collect(),
            ),
            _ => None,
        },
    };

    Ok(HerderTrack {
        herder,
        positions,
        indicators,
        engagement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_table() -> TrialTable {
        // Two targets; target 0 near p0, target 1 near p1.
        TrialTable::from_columns([
            ("time", vec![0.0, 0.1, 0.2]),
            ("TrialID", vec![7.0, 7.0, 7.0]),
            ("t0x", vec![-10.0, -10.0, -10.0]),
            ("t0z", vec![0.0, 0.0, 0.0]),
            ("t1x", vec![10.0, 10.0, 10.0]),
            ("t1z", vec![0.0, 0.0, 0.0]),
            ("t0run", vec![0.0, 1.0, 1.0]),
            ("t1run", vec![0.0, 0.0, 1.0]),
            ("p0x", vec![-12.0, -12.0, -12.0]),
            ("p0z", vec![0.0, 0.0, 0.0]),
            ("p1x", vec![12.0, 12.0, 12.0]),
            ("p1z", vec![0.0, 0.0, 0.0]),
        ])
    }

    #[test]
    fn test_raw_recording_derives_engagement() {
        let record =
            TrialRecord::from_table("S1", TrialNumber(7), Pairing::HumanHuman, &raw_table())
                .unwrap();
        assert_eq!(record.num_targets(), 2);
        assert_eq!(record.trial_id(), Some(TrialNumber(7)));
        assert_eq!(
            record.engagement(PlayerSlot::First).unwrap(),
            &[Engagement::Idle, Engagement::Target(0), Engagement::Target(0)]
        );
        assert_eq!(
            record.engagement(PlayerSlot::Second).unwrap(),
            &[Engagement::Idle, Engagement::Idle, Engagement::Target(1)]
        );
        assert_eq!(
            record.indicators(PlayerSlot::Second).unwrap()[2].as_slice(),
            &[false, true]
        );
    }

    #[test]
    fn test_engagement_file_with_slot_aliases() {
        let table = TrialTable::from_columns([
            ("time", vec![0.0, 0.1]),
            ("TrialID", vec![9.0, 9.0]),
            ("numTargs", vec![3.0, 3.0]),
            ("HA0_engagement", vec![-1.0, 2.0]),
            ("HA1_engagement", vec![1.0, 1.0]),
        ]);
        let record =
            TrialRecord::from_table("S2", TrialNumber(9), Pairing::AaAa, &table).unwrap();
        assert_eq!(record.num_targets(), 3);
        assert_eq!(
            record.engagement(PlayerSlot::First).unwrap(),
            &[Engagement::Idle, Engagement::Target(2)]
        );
        let err = record.positions(PlayerSlot::Second).unwrap_err();
        assert!(
            matches!(&err, RecordError::SchemaMismatch { column, .. } if column == "hA1x"),
            "{err}"
        );
    }

    #[test]
    fn test_human_aa_columns() {
        let table = TrialTable::from_columns([
            ("numTargs", vec![3.0]),
            ("p0_engagement", vec![0.0]),
            ("hA0_engagement", vec![1.0]),
            ("p0TA0", vec![1.0]),
            ("p0TA1", vec![0.0]),
            ("p0TA2", vec![0.0]),
        ]);
        let record =
            TrialRecord::from_table("S3", TrialNumber(7), Pairing::HumanAa, &table).unwrap();
        assert_eq!(record.herder(PlayerSlot::Second).prefix(), "hA0");
        assert_eq!(
            record.engagement(PlayerSlot::Second).unwrap(),
            &[Engagement::Target(1)]
        );
        assert_eq!(
            record.indicators(PlayerSlot::First).unwrap()[0].as_slice(),
            &[true, false, false]
        );
        assert!(record.indicators(PlayerSlot::Second).unwrap_err().is_schema_mismatch());
        assert!(record.time().is_err());
    }

    #[test]
    fn test_invalid_target_count_is_malformed() {
        let table = TrialTable::from_columns([("numTargs", vec![9.0])]);
        let err = TrialRecord::from_table("S4", TrialNumber(7), Pairing::HumanHuman, &table)
            .unwrap_err();
        assert!(err.is_malformed_trial_file(), "{err}");
    }

    #[test]
    fn test_empty_position_cell_is_malformed() {
        let table = TrialTable::from_columns([
            ("t0x", vec![0.0, 0.0]),
            ("t0z", vec![0.0, 0.0]),
            ("t0run", vec![1.0, 1.0]),
            ("p0x", vec![1.0, f64::NAN]),
            ("p0z", vec![0.0, 0.0]),
            ("p1x", vec![5.0, 5.0]),
            ("p1z", vec![0.0, 0.0]),
        ]);
        let err = TrialRecord::from_table("S5", TrialNumber(7), Pairing::HumanHuman, &table)
            .unwrap_err();
        assert!(err.is_malformed_trial_file(), "{err}");
        let message = err.to_string();
        assert!(message.contains("'p0x' at row 2"), "{message}");
    }

    #[test]
    fn test_empty_indicator_cell_is_malformed() {
        let table = TrialTable::from_columns([
            ("numTargs", vec![2.0, 2.0]),
            ("p0TA0", vec![1.0, 0.0]),
            ("p0TA1", vec![0.0, f64::NAN]),
        ]);
        let err = TrialRecord::from_table("S6", TrialNumber(7), Pairing::HumanHuman, &table)
            .unwrap_err();
        assert!(err.to_string().contains("'p0TA1' at row 2"), "{err}");
    }
}
