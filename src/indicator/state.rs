#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Read,
    Unread,
}

impl IndicatorState {
    pub fn is_alert(self) -> bool {
        self == IndicatorState::Unread
    }
}
