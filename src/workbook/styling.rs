//! Visual markers on the written cells and the table frame

use serde::{Deserialize, Serialize};

use super::cell::CellRef;
use super::layout::SheetLayout;
use super::sheet::{BorderWeight, Sheet};
use crate::reconciliation::{AdjustmentKind, RowAdjustment};

/// Highlight applied to a cell, by meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Local target and achieved local total
    TargetLocal,
    /// Reference target and achieved reference total
    TargetReference,
    /// Per-row adjusted local value left as allocated
    AdjustedLocal,
    /// Row nudged to fix the reference total
    CrossCurrencyNudge,
    /// Row that absorbed the leftover local difference
    Leftover,
    /// Row that absorbed the leftover at the cost of its reference value
    ForcedLeftover,
}

impl Marker {
    /// Fill colour as `0xRRGGBB`
    pub fn rgb(self) -> u32 {
        match self {
            Marker::TargetLocal => 0x98FB98,
            Marker::TargetReference => 0xADD8E6,
            Marker::AdjustedLocal => 0xFFFF00,
            Marker::CrossCurrencyNudge => 0xFFA500,
            Marker::Leftover => 0xE6E6FA,
            Marker::ForcedLeftover => 0xFA8072,
        }
    }
}

impl From<AdjustmentKind> for Marker {
    fn from(kind: AdjustmentKind) -> Self {
        match kind {
            AdjustmentKind::CrossCurrencyNudge => Marker::CrossCurrencyNudge,
            AdjustmentKind::Leftover => Marker::Leftover,
            AdjustmentKind::ForcedLeftover => Marker::ForcedLeftover,
        }
    }
}

fn mark(sheet: &mut Sheet, cell: CellRef, marker: Marker) {
    sheet.style_mut(cell).fill = Some(marker.rgb());
}

/// Colour the target, per-row and summary cells of a sheet with `rows` data rows.
///
/// Adjusted local cells of rows listed in `adjustments` get the marker of their
/// adjustment kind instead of the plain per-row marker.
pub fn apply_markers(
    sheet: &mut Sheet,
    layout: &SheetLayout,
    rows: usize,
    adjustments: &[RowAdjustment],
) {
    mark(sheet, layout.target_local_cell(), Marker::TargetLocal);
    mark(sheet, layout.target_reference_cell(), Marker::TargetReference);

    let summary_row = layout.summary_row(rows);
    mark(
        sheet,
        CellRef::new(summary_row, layout.adjusted_local),
        Marker::TargetLocal,
    );
    mark(
        sheet,
        CellRef::new(summary_row, layout.adjusted_reference),
        Marker::TargetReference,
    );

    for index in 0..rows {
        mark(
            sheet,
            layout.data_cell(index, layout.adjusted_local),
            Marker::AdjustedLocal,
        );
    }
    for adjustment in adjustments.iter().filter(|a| a.index < rows) {
        mark(
            sheet,
            layout.data_cell(adjustment.index, layout.adjusted_local),
            adjustment.kind.into(),
        );
    }
}

/// Draw the table frame around the fixed rows, the data and the summary row
pub fn apply_frame(sheet: &mut Sheet, layout: &SheetLayout, rows: usize) {
    let (first, last) = layout.frame_columns();
    let start = layout.start_row;
    let summary_row = layout.summary_row(rows);

    for row in start.saturating_sub(3)..=summary_row {
        sheet.style_mut(CellRef::new(row, first)).border_left = Some(BorderWeight::Thick);
        sheet.style_mut(CellRef::new(row, last)).border_right = Some(BorderWeight::Thick);
    }

    let bottoms = [
        (start.checked_sub(4), BorderWeight::Thin),
        (start.checked_sub(1), BorderWeight::Thin),
        (start.checked_sub(2), BorderWeight::Thick),
        (summary_row.checked_sub(1), BorderWeight::Thin),
        (Some(summary_row), BorderWeight::Thick),
    ];
    for (row, weight) in bottoms {
        let Some(row) = row else { continue };
        for column in first..=last {
            sheet.style_mut(CellRef::new(row, column)).border_bottom = Some(weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn fill(sheet: &Sheet, cell: &str) -> Option<u32> {
        sheet.style(cell.parse().unwrap()).and_then(|style| style.fill)
    }

    #[test]
    fn test_markers() {
        let layout = SheetLayout::default();
        let mut sheet = Sheet::new("Sheet1");
        let adjustments = vec![
            RowAdjustment {
                index: 0,
                kind: AdjustmentKind::CrossCurrencyNudge,
                original_local: BigDecimal::from(81),
                final_local: BigDecimal::from(82),
            },
            RowAdjustment {
                index: 1,
                kind: AdjustmentKind::Leftover,
                original_local: BigDecimal::from(153),
                final_local: BigDecimal::from(152),
            },
        ];

        apply_markers(&mut sheet, &layout, 3, &adjustments);

        assert_eq!(fill(&sheet, "G3"), Some(0x98FB98));
        assert_eq!(fill(&sheet, "H3"), Some(0xADD8E6));
        assert_eq!(fill(&sheet, "G9"), Some(0x98FB98));
        assert_eq!(fill(&sheet, "H9"), Some(0xADD8E6));
        assert_eq!(fill(&sheet, "G6"), Some(Marker::CrossCurrencyNudge.rgb()));
        assert_eq!(fill(&sheet, "G7"), Some(Marker::Leftover.rgb()));
        assert_eq!(fill(&sheet, "G8"), Some(0xFFFF00));
        assert_eq!(fill(&sheet, "H6"), None);
    }

    #[test]
    fn test_frame() {
        let layout = SheetLayout::default();
        let mut sheet = Sheet::new("Sheet1");

        apply_frame(&mut sheet, &layout, 3);

        let style = |cell: &str| sheet.style(cell.parse().unwrap()).cloned().unwrap_or_default();
        assert_eq!(style("B3").border_left, Some(BorderWeight::Thick));
        assert_eq!(style("H9").border_right, Some(BorderWeight::Thick));
        assert_eq!(style("B2").border_left, None);
        assert_eq!(style("D2").border_bottom, Some(BorderWeight::Thin));
        assert_eq!(style("D4").border_bottom, Some(BorderWeight::Thick));
        assert_eq!(style("D5").border_bottom, Some(BorderWeight::Thin));
        assert_eq!(style("D8").border_bottom, Some(BorderWeight::Thin));
        assert_eq!(style("H9").border_bottom, Some(BorderWeight::Thick));
        assert_eq!(style("I9"), Default::default());
    }
}
