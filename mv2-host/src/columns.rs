//! Result de-interleaver: response words plus plan, out come named columns.

use mv2_asm::{FrameError, Word};

use crate::error::HostError;
use crate::script::PlanEntry;

/// Default heading prefix; also the sentinel an `outputName` uses to stay
/// unnamed.
const HEADING_DEFAULT_PREFIX: &str = "unknown";

/// Fold the response data region back into per-index columns.
///
/// Pure in its inputs: walking the plan in order while consuming the data
/// region left to right reproduces the instrument's emission order exactly,
/// so no tags are needed on the wire. Columns no plan entry routes to stay
/// empty; a data region shorter than the plan demands means the frame lied
/// about itself and is rejected like a short frame.
pub fn deinterleave(words: &[Word], plan: &[PlanEntry]) -> Result<Vec<Vec<Word>>, HostError> {
    let column_count = match plan.iter().map(|e| e.output_index).max() {
        Some(max) if max >= 0 => max as usize + 1,
        _ => return Ok(Vec::new()),
    };
    let mut columns = vec![Vec::new(); column_count];
    let mut cursor = 0usize;

    let mut i = 0;
    while i < plan.len() {
        let entry = &plan[i];
        if entry.loop_count > 0 {
            // First entry of a loop span: consume count × span words,
            // accumulating per column before routing.
            let span = entry.loop_span;
            let mut collected = vec![Vec::new(); column_count];
            for _ in 0..entry.loop_count {
                for member in &plan[i..i + span] {
                    let word = take(words, &mut cursor)?;
                    if member.output_index >= 0 {
                        collected[member.output_index as usize].push(word);
                    }
                }
            }
            for (column, samples) in columns.iter_mut().zip(collected) {
                if samples.is_empty() {
                    continue;
                }
                if entry.averaged {
                    column.push(average(&samples));
                } else {
                    column.extend(samples);
                }
            }
            i += span;
        } else {
            let word = take(words, &mut cursor)?;
            if entry.output_index >= 0 {
                columns[entry.output_index as usize].push(word);
            }
            i += 1;
        }
    }
    Ok(columns)
}

fn take(words: &[Word], cursor: &mut usize) -> Result<Word, HostError> {
    let word = words
        .get(*cursor)
        .copied()
        .ok_or(HostError::Frame(FrameError::ShortFrame))?;
    *cursor += 1;
    Ok(word)
}

/// Round-half-up integer average over the collected samples.
fn average(samples: &[Word]) -> Word {
    let count = samples.len() as u32;
    let sum: u32 = samples.iter().copied().map(u32::from).sum();
    ((sum + count / 2) / count) as Word
}

/// Synthesize column headings from the plan.
///
/// Every column starts as `unknown<i>`; a plan entry with a non-negative
/// index and a name other than the bare `"unknown"` sentinel overwrites its
/// column's heading. Ordering follows the index, not the plan.
pub fn headings(plan: &[PlanEntry], column_count: usize) -> Vec<String> {
    let mut names: Vec<String> = (0..column_count)
        .map(|i| format!("{HEADING_DEFAULT_PREFIX}{i}"))
        .collect();
    for entry in plan {
        if entry.output_index >= 0 && entry.output_name != HEADING_DEFAULT_PREFIX {
            names[entry.output_index as usize] = entry.output_name.clone();
        }
    }
    names
}

/// Render columns row-major as CSV, one line per row, until every column is
/// exhausted. Cells a shorter column can't fill render empty.
pub fn results_csv(columns: &[Vec<Word>]) -> String {
    let mut out = String::new();
    let mut row = 0;
    loop {
        let mut has_more = false;
        for (index, column) in columns.iter().enumerate() {
            if let Some(value) = column.get(row) {
                out.push_str(&value.to_string());
                if index < columns.len() - 1 {
                    out.push(',');
                }
                if column.len() > row + 1 {
                    has_more = true;
                }
            } else {
                out.push(',');
            }
        }
        out.push('\n');
        row += 1;
        if !has_more {
            break;
        }
    }
    out
}

/// Render headings as one comma-separated line.
pub fn headings_csv(headings: &[String]) -> String {
    headings.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(output_index: i32, name: &str) -> PlanEntry {
        PlanEntry {
            output_index,
            output_name: name.to_string(),
            in_loop: false,
            loop_count: 0,
            loop_span: 0,
            averaged: false,
        }
    }

    fn loop_head(output_index: i32, name: &str, count: u8, span: usize, averaged: bool) -> PlanEntry {
        PlanEntry {
            output_index,
            output_name: name.to_string(),
            in_loop: true,
            loop_count: count,
            loop_span: span,
            averaged,
        }
    }

    fn loop_member(output_index: i32, name: &str) -> PlanEntry {
        PlanEntry {
            in_loop: true,
            ..entry(output_index, name)
        }
    }

    #[test]
    fn plain_entries_route_by_index() {
        let plan = [entry(1, "By"), entry(0, "Bx")];
        let columns = deinterleave(&[200, 100], &plan).unwrap();
        assert_eq!(vec![vec![100], vec![200]], columns);
    }

    #[test]
    fn dropped_entries_consume_but_do_not_route() {
        let plan = [entry(-1, "unknown"), entry(0, "Bx")];
        let columns = deinterleave(&[999, 100], &plan).unwrap();
        assert_eq!(vec![vec![100]], columns);
    }

    #[test]
    fn averaged_loop_rounds_half_up() {
        let plan = [loop_head(0, "Bx", 4, 1, true)];
        let columns = deinterleave(&[10, 20, 30, 41], &plan).unwrap();
        // (10 + 20 + 30 + 41 + 2) / 4
        assert_eq!(vec![vec![25]], columns);
    }

    #[test]
    fn non_averaged_loop_keeps_iteration_order() {
        let plan = [loop_head(0, "Bx", 2, 2, false), loop_member(1, "By")];
        let columns = deinterleave(&[100, 200, 101, 201], &plan).unwrap();
        assert_eq!(vec![vec![100, 101], vec![200, 201]], columns);
    }

    #[test]
    fn dropped_loop_member_is_skipped_every_iteration() {
        let plan = [loop_head(0, "Bx", 2, 2, false), loop_member(-1, "unknown")];
        let columns = deinterleave(&[100, 900, 101, 901], &plan).unwrap();
        assert_eq!(vec![vec![100, 101]], columns);
    }

    #[test]
    fn sparse_columns_stay_empty() {
        let plan = [entry(2, "Bz")];
        let columns = deinterleave(&[300], &plan).unwrap();
        assert_eq!(vec![Vec::<Word>::new(), Vec::new(), vec![300]], columns);
    }

    #[test]
    fn empty_plan_yields_no_columns() {
        assert!(deinterleave(&[], &[]).unwrap().is_empty());
        // all entries dropped: no columns either
        let plan = [entry(-1, "unknown")];
        assert!(deinterleave(&[7], &plan).unwrap().is_empty());
    }

    #[test]
    fn underrun_is_a_short_frame() {
        let plan = [loop_head(0, "Bx", 3, 1, false)];
        let err = deinterleave(&[1, 2], &plan).unwrap_err();
        assert!(matches!(err, HostError::Frame(FrameError::ShortFrame)));
    }

    #[test]
    fn deinterleave_is_deterministic() {
        let plan = [loop_head(0, "Bx", 2, 2, true), loop_member(1, "By")];
        let words = [10, 20, 11, 21];
        assert_eq!(
            deinterleave(&words, &plan).unwrap(),
            deinterleave(&words, &plan).unwrap()
        );
    }

    #[test]
    fn headings_default_then_override_by_index() {
        let plan = [entry(0, "Bx"), entry(1, "unknown"), entry(2, "T")];
        assert_eq!(vec!["Bx", "unknown1", "T"], headings(&plan, 3));
    }

    #[test]
    fn later_plan_entries_win_heading_conflicts() {
        let plan = [entry(0, "first"), entry(0, "second")];
        assert_eq!(vec!["second"], headings(&plan, 1));
    }

    #[test]
    fn csv_rows_are_row_major_with_ragged_tails() {
        let columns = vec![vec![1, 3], vec![2]];
        // a present cell still takes its separator, so a missing trailing
        // cell leaves a dangling comma, as prior consumers expect
        assert_eq!("1,2\n3,,\n", results_csv(&columns));
        assert_eq!("Bx,By", headings_csv(&["Bx".into(), "By".into()]));
    }
}
