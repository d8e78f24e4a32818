/// Value written to every pick texel before drawing.
pub const CLEAR_SENTINEL: u32 = u32::MAX;

/// Outcome of a pick.
///
/// The raw integer encoding is `0` for background, `> 0` for a 1-based
/// instance id and `-1` when picking is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickResult {
    /// Nothing under the pointer, or the pointer is outside the viewport.
    Background,
    /// The 1-based id of the instance under the pointer.
    Instance(u32),
    /// The pick surface could not be created.
    Unavailable,
}

impl PickResult {
    /// Decode the raw integer form.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Background,
            id if id > 0 => Self::Instance(id.unsigned_abs()),
            _ => Self::Unavailable,
        }
    }

    /// Encode to the raw integer form.
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Background => 0,
            Self::Instance(id) => i32::try_from(id).unwrap_or(i32::MAX),
            Self::Unavailable => -1,
        }
    }

    /// Interpret a texel read back from the pick surface, given `count`
    /// drawn instances. The clear sentinel, zero and ids past `count` are
    /// background.
    pub fn from_texel(texel: u32, count: u32) -> Self {
        if texel == CLEAR_SENTINEL || texel == 0 || texel > count {
            Self::Background
        } else {
            Self::Instance(texel)
        }
    }

    /// The instance id, if an instance was hit.
    pub fn instance(self) -> Option<u32> {
        match self {
            Self::Instance(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_encoding_round_trips() {
        for result in [
            PickResult::Background,
            PickResult::Instance(1),
            PickResult::Instance(42),
            PickResult::Unavailable,
        ] {
            assert_eq!(PickResult::from_raw(result.to_raw()), result);
        }
        assert_eq!(PickResult::Unavailable.to_raw(), -1);
    }

    #[test]
    fn sentinel_is_background() {
        assert_eq!(
            PickResult::from_texel(CLEAR_SENTINEL, 4),
            PickResult::Background
        );
        assert_eq!(PickResult::from_texel(0, 4), PickResult::Background);
    }

    #[test]
    fn texels_within_count_are_instances() {
        assert_eq!(PickResult::from_texel(1, 4), PickResult::Instance(1));
        assert_eq!(PickResult::from_texel(4, 4), PickResult::Instance(4));
        assert_eq!(PickResult::from_texel(5, 4), PickResult::Background);
    }

    #[test]
    fn unconfigured_set_never_hits() {
        // The fallback instance writes 1 but has no id.
        assert_eq!(PickResult::from_texel(1, 0), PickResult::Background);
    }

    #[test]
    fn any_texel_maps_into_valid_range() {
        let count = 4;
        for texel in [0, 1, 2, 3, 4, 5, 1000, CLEAR_SENTINEL] {
            let raw = PickResult::from_texel(texel, count).to_raw();
            assert!(raw == 0 || (1..=count as i32).contains(&raw));
        }
    }
}
