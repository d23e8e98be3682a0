use serde::Serialize;

const INDENT_STEP_PX: u32 = 20;
const MAX_INDENT_PX: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarSize {
    Large,
    Medium,
    Small,
    Compact,
}

impl AvatarSize {
    pub fn px(self) -> u32 {
        match self {
            AvatarSize::Large => 40,
            AvatarSize::Medium => 32,
            AvatarSize::Small => 28,
            AvatarSize::Compact => 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontScale {
    Normal,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresentationHints {
    pub indent_px: u32,
    pub avatar_size: AvatarSize,
    pub avatar_px: u32,
    pub font_scale: FontScale,
}

impl PresentationHints {
    /// Step function of depth. Everything saturates at depth 3.
    pub fn for_depth(depth: u32) -> Self {
        let avatar_size = match depth {
            0 => AvatarSize::Large,
            1 => AvatarSize::Medium,
            2 => AvatarSize::Small,
            _ => AvatarSize::Compact,
        };
        let font_scale = match depth {
            0..=2 => FontScale::Normal,
            _ => FontScale::Compact,
        };

        Self {
            indent_px: depth.saturating_mul(INDENT_STEP_PX).min(MAX_INDENT_PX),
            avatar_size,
            avatar_px: avatar_size.px(),
            font_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_for_shallow_depths() {
        let root = PresentationHints::for_depth(0);
        assert_eq!(root.indent_px, 0);
        assert_eq!(root.avatar_size, AvatarSize::Large);
        assert_eq!(root.font_scale, FontScale::Normal);

        let reply = PresentationHints::for_depth(1);
        assert_eq!(reply.indent_px, 20);
        assert_eq!(reply.avatar_size, AvatarSize::Medium);

        let nested = PresentationHints::for_depth(2);
        assert_eq!(nested.indent_px, 40);
        assert_eq!(nested.avatar_size, AvatarSize::Small);
        assert_eq!(nested.font_scale, FontScale::Normal);
    }

    #[test]
    fn saturates_from_depth_three() {
        let floor = PresentationHints::for_depth(3);
        assert_eq!(floor.indent_px, 60);
        assert_eq!(floor.avatar_size, AvatarSize::Compact);
        assert_eq!(floor.font_scale, FontScale::Compact);
        for depth in [4, 7, 50, u32::MAX] {
            assert_eq!(PresentationHints::for_depth(depth), floor);
        }
    }

    #[test]
    fn avatar_shrinks_with_depth() {
        let sizes: Vec<u32> = (0..4)
            .map(|depth| PresentationHints::for_depth(depth).avatar_px)
            .collect();
        assert!(sizes.windows(2).all(|pair| pair[0] > pair[1]));
    }
}
