use super::IndicatorState;

/// Maps a window listing to an indicator state.
///
/// The target counts as read while any listed window title contains it
/// verbatim. An empty target never matches, so it always reads as unread.
pub fn classify(window_list: &str, target: &str) -> IndicatorState {
    if target.is_empty() {
        return IndicatorState::Unread;
    }

    let open = window_list.lines().any(|line| line.contains(target));
    if open {
        IndicatorState::Read
    } else {
        IndicatorState::Unread
    }
}
