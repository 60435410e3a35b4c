use crossterm::style::{Color, ContentStyle, StyledContent};
use std::fmt::Display;

use crate::config::ThemeConfig;

/// Named roles a piece of terminal output can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleToken {
    Banner,
    User,
    Assistant,
    Meta,
    Error,
    Tool,
    Path,
}

/// Foreground colors per [`StyleToken`]. A `None` slot prints unstyled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    banner: Option<Color>,
    user: Option<Color>,
    assistant: Option<Color>,
    meta: Option<Color>,
    error: Option<Color>,
    tool: Option<Color>,
    path: Option<Color>,
}

fn rgb([r, g, b]: [u8; 3]) -> Option<Color> {
    Some(Color::Rgb { r, g, b })
}

impl Theme {
    /// A theme that never emits escape sequences.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Builds the theme from configuration. Colors are dropped when disabled
    /// in config or when `is_terminal` is false.
    pub fn from_config(config: &ThemeConfig, is_terminal: bool) -> Self {
        if !config.enabled || !is_terminal {
            return Self::plain();
        }

        Self {
            banner: rgb(config.banner),
            user: rgb(config.user),
            assistant: rgb(config.assistant),
            meta: rgb(config.meta),
            error: rgb(config.error),
            tool: rgb(config.tool),
            path: rgb(config.path),
        }
    }

    pub fn color(&self, token: StyleToken) -> Option<Color> {
        match token {
            StyleToken::Banner => self.banner,
            StyleToken::User => self.user,
            StyleToken::Assistant => self.assistant,
            StyleToken::Meta => self.meta,
            StyleToken::Error => self.error,
            StyleToken::Tool => self.tool,
            StyleToken::Path => self.path,
        }
    }

    pub fn paint<D: Display>(&self, token: StyleToken, content: D) -> StyledContent<D> {
        let mut style = ContentStyle::new();
        style.foreground_color = self.color(token);
        StyledContent::new(style, content)
    }
}
