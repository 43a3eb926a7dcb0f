//! Derived progress figures.
//!
//! Both figures are whole percentages rounded half up using integer
//! arithmetic only.

use crate::steps::Position;

/// Percentage of the way through the declared steps.
///
/// The first step is 0 and each further step adds `100 / step_count`. The
/// completed step is always 100.
pub fn form_completion_percentage(position: Position, step_count: usize) -> u8 {
    match position {
        Position::Completed => 100,
        Position::Step(_) if step_count == 0 => 0,
        Position::Step(index) => {
            let index = index.min(step_count - 1);
            let rounded = (200 * index + step_count) / (2 * step_count);
            u8::try_from(rounded).unwrap_or(100)
        }
    }
}

/// Blend form position with in-flight request progress.
///
/// The request fills the part of the bar the form has not covered yet:
/// `form + (100 - form) * progress / 100`.
pub fn overall_progress(form_completion: u8, request_progress: u8) -> u8 {
    let form = u32::from(form_completion.min(100));
    let request = u32::from(request_progress.min(100));
    let hundredths = form * 100 + (100 - form) * request;
    u8::try_from((hundredths + 50) / 100).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_step_percentages() {
        assert_eq!(form_completion_percentage(Position::Step(0), 3), 0);
        assert_eq!(form_completion_percentage(Position::Step(1), 3), 33);
        assert_eq!(form_completion_percentage(Position::Step(2), 3), 67);
        assert_eq!(form_completion_percentage(Position::Completed, 3), 100);
    }

    #[test]
    fn test_rounds_half_up() {
        // 1/8 = 12.5
        assert_eq!(form_completion_percentage(Position::Step(1), 8), 13);
        // 3/8 = 37.5
        assert_eq!(form_completion_percentage(Position::Step(3), 8), 38);
    }

    #[test]
    fn test_single_step_form() {
        assert_eq!(form_completion_percentage(Position::Step(0), 1), 0);
        assert_eq!(form_completion_percentage(Position::Completed, 1), 100);
    }

    #[test]
    fn test_overall_blend() {
        assert_eq!(overall_progress(67, 50), 84);
        assert_eq!(overall_progress(0, 0), 0);
        assert_eq!(overall_progress(0, 40), 40);
        assert_eq!(overall_progress(33, 0), 33);
        assert_eq!(overall_progress(67, 100), 100);
        assert_eq!(overall_progress(100, 0), 100);
    }

    #[test]
    fn test_overall_clamps_inputs() {
        assert_eq!(overall_progress(200, 200), 100);
    }
}
