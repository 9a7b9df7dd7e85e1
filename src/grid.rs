//! Which grid cells become frames, and in what order
//!
//! The frame index of a cell and the order frames are played in are the same number.
//! Both directions of that mapping live here, so nothing else re-derives the formula.

use crate::error::*;
use crate::settings::Settings;

/// How frame indices are assigned to grid cells
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ReadOrder {
    /// Left to right, then top to bottom: `index = row * cols + col`
    #[default]
    RowMajor,
    /// Top to bottom, then left to right: `index = col * rows + row`
    ColumnMajor,
}

/// A grid cell that will become a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameSlot {
    pub row: u32,
    pub col: u32,
    /// Frame index in the sheet, before exclusions are applied
    pub index: u32,
}

/// Frame index of the cell at `row`, `col`
#[inline]
#[must_use]
pub fn index_of(row: u32, col: u32, rows: u32, cols: u32, order: ReadOrder) -> u32 {
    debug_assert!(row < rows && col < cols);
    match order {
        ReadOrder::RowMajor => row * cols + col,
        ReadOrder::ColumnMajor => col * rows + row,
    }
}

/// `(row, col)` of the cell with the given frame index. Inverse of [`index_of`].
#[inline]
#[must_use]
pub fn cell_of(index: u32, rows: u32, cols: u32, order: ReadOrder) -> (u32, u32) {
    debug_assert!(u64::from(index) < u64::from(rows) * u64::from(cols));
    match order {
        ReadOrder::RowMajor => (index / cols, index % cols),
        ReadOrder::ColumnMajor => (index % rows, index / rows),
    }
}

/// Frames in the order they'll be played.
///
/// Indices at or past `total_frames` and the excluded ones are dropped.
/// Counting indices upwards visits the grid row-by-row for row-major order
/// and column-by-column for column-major order, so no separate traversal is needed.
pub fn sequence(settings: &Settings) -> GifResult<Vec<FrameSlot>> {
    let Settings { rows, cols, read_order, .. } = *settings;
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidGrid(format!("rows and columns must be at least 1 (got {rows}×{cols})")));
    }
    let end = settings.total_frames.min(rows.saturating_mul(cols));
    let slots: Vec<_> = (0..end)
        .filter(|index| !settings.excluded_frames.contains(index))
        .map(|index| {
            let (row, col) = cell_of(index, rows, cols, read_order);
            FrameSlot { row, col, index }
        })
        .collect();

    if slots.is_empty() {
        return Err(Error::EmptySequence);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(settings: &Settings) -> Vec<u32> {
        sequence(settings).unwrap().iter().map(|s| s.index).collect()
    }

    #[test]
    fn row_major_order() {
        let s = Settings::grid(2, 3);
        let slots = sequence(&s).unwrap();
        assert_eq!(slots.iter().map(|s| (s.row, s.col)).collect::<Vec<_>>(),
            [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(indices(&s), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn column_major_order() {
        let s = Settings { read_order: ReadOrder::ColumnMajor, ..Settings::grid(2, 3) };
        let slots = sequence(&s).unwrap();
        // cells visited column by column
        assert_eq!(slots.iter().map(|s| (s.row, s.col)).collect::<Vec<_>>(),
            [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]);
        // and labelled by their row-major position they read [0,3,1,4,2,5]
        let row_major: Vec<_> = slots.iter().map(|s| index_of(s.row, s.col, 2, 3, ReadOrder::RowMajor)).collect();
        assert_eq!(row_major, [0, 3, 1, 4, 2, 5]);
        assert_eq!(indices(&s), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn exclusions_and_cutoff() {
        let mut s = Settings { total_frames: 4, ..Settings::grid(2, 2) };
        s.excluded_frames.insert(2);
        assert_eq!(indices(&s), [0, 1, 3]);

        let mut s = Settings { total_frames: 5, ..Settings::grid(3, 3) };
        s.excluded_frames.extend([1, 7, 8]);
        // 7 and 8 are past the cutoff already
        assert_eq!(sequence(&s).unwrap().len(), 5 - 1);
    }

    #[test]
    fn nothing_left() {
        let mut s = Settings::grid(1, 2);
        s.excluded_frames.extend([0, 1]);
        assert!(matches!(sequence(&s), Err(Error::EmptySequence)));

        let s = Settings { total_frames: 0, ..Settings::grid(2, 2) };
        assert!(matches!(sequence(&s), Err(Error::EmptySequence)));
    }

    #[test]
    fn index_mapping_round_trips() {
        for order in [ReadOrder::RowMajor, ReadOrder::ColumnMajor] {
            for (rows, cols) in [(1, 1), (2, 3), (4, 1), (5, 7)] {
                for index in 0..rows * cols {
                    let (r, c) = cell_of(index, rows, cols, order);
                    assert!(r < rows && c < cols);
                    assert_eq!(index_of(r, c, rows, cols, order), index);
                }
            }
        }
        assert_eq!(index_of(1, 2, 2, 3, ReadOrder::ColumnMajor), 5);
        assert_eq!(index_of(1, 0, 2, 3, ReadOrder::ColumnMajor), 1);
    }
}
