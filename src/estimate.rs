//! Plugging in an external grid guesser
//!
//! Something outside this crate (a vision model, a heuristic) may look at the sheet and
//! guess its layout. Those guesses are only defaults: anything the user set explicitly wins.

use crate::error::*;
use crate::settings::Settings;
use imgref::ImgRef;
use rgb::RGBA8;

/// A guess at how a sheet is laid out
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridEstimate {
    pub rows: u32,
    pub cols: u32,
    pub total_frames: u32,
}

/// Grid values the user set explicitly
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GridOverrides {
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub total_frames: Option<u32>,
}

pub trait GridEstimator {
    fn estimate(&self, sheet: ImgRef<'_, RGBA8>) -> GifResult<GridEstimate>;
}

impl GridEstimate {
    /// Settings with this estimate filling the grid fields the user didn't set.
    ///
    /// Nonsense guesses (zero rows or columns) are ignored. The frame count is clamped to the grid,
    /// and when the user changes the grid but not the count, the count covers the whole grid.
    #[must_use]
    pub fn apply(&self, settings: &Settings, user: GridOverrides) -> Settings {
        let usable = self.rows > 0 && self.cols > 0;
        let pick = |user: Option<u32>, guess: u32, current: u32| {
            user.unwrap_or(if usable { guess } else { current })
        };
        let rows = pick(user.rows, self.rows, settings.rows);
        let cols = pick(user.cols, self.cols, settings.cols);
        let cells = rows.saturating_mul(cols);
        let grid_is_guessed = usable && (user.rows.is_none() || user.cols.is_none());
        let total_frames = match user.total_frames {
            Some(n) => n,
            None if grid_is_guessed && self.total_frames > 0 => self.total_frames.min(cells),
            None => cells,
        };
        Settings {
            rows,
            cols,
            total_frames,
            ..settings.clone()
        }
    }
}

/// Asks `estimator` for a layout, keeping the current settings if it fails
pub fn estimate_or_keep(estimator: &dyn GridEstimator, sheet: ImgRef<'_, RGBA8>, settings: &Settings, user: GridOverrides) -> Settings {
    match estimator.estimate(sheet) {
        Ok(guess) => guess.apply(settings, user),
        Err(err) => {
            log::warn!("grid estimate unavailable: {err}");
            settings.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::ImgVec;

    struct Fixed(Option<GridEstimate>);

    impl GridEstimator for Fixed {
        fn estimate(&self, _: ImgRef<'_, RGBA8>) -> GifResult<GridEstimate> {
            self.0.ok_or_else(|| Error::InvalidGrid("no guess".into()))
        }
    }

    #[test]
    fn guess_fills_unset_fields() {
        let guess = GridEstimate { rows: 4, cols: 6, total_frames: 22 };
        let s = guess.apply(&Settings::default(), GridOverrides::default());
        assert_eq!((s.rows, s.cols, s.total_frames), (4, 6, 22));
        s.validate().unwrap();
    }

    #[test]
    fn user_values_win() {
        let guess = GridEstimate { rows: 4, cols: 6, total_frames: 22 };
        let user = GridOverrides { rows: Some(2), cols: Some(3), total_frames: None };
        let s = guess.apply(&Settings::default(), user);
        assert_eq!((s.rows, s.cols, s.total_frames), (2, 3, 6));

        let user = GridOverrides { rows: Some(2), cols: None, total_frames: None };
        let s = guess.apply(&Settings::default(), user);
        assert_eq!((s.rows, s.cols, s.total_frames), (2, 6, 12));
    }

    #[test]
    fn bad_guess_is_ignored() {
        let sheet = ImgVec::new(vec![RGBA8::new(0, 0, 0, 0); 4], 2, 2);
        let current = Settings::grid(3, 3);
        let s = estimate_or_keep(&Fixed(None), sheet.as_ref(), &current, GridOverrides::default());
        assert_eq!(s, current);

        let zero = GridEstimate { rows: 0, cols: 5, total_frames: 5 };
        let s = estimate_or_keep(&Fixed(Some(zero)), sheet.as_ref(), &current, GridOverrides::default());
        assert_eq!((s.rows, s.cols, s.total_frames), (3, 3, 9));
    }
}
