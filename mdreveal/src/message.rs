//! Binds chat messages to output regions.
//!
//! The presenter decides how a message reaches the page: most messages are rendered once, while
//! assistant replies are handed back as a [`PlaybackSession`] for the host (or `mdreveal-tokio`)
//! to drive.

use crate::options::PresenterOptions;
use crate::playback::PlaybackSession;
use crate::region::{MemoryRegion, OutputRegion, RegionError};
use crate::render::{ChatMarkdown, Markdown};

#[cfg(feature = "serde")]
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Error => "error",
        }
    }

    /// Class name carried by regions for this role, e.g. `assistant-message`.
    pub fn class_name(self) -> &'static str {
        match self {
            Role::User => "user-message",
            Role::Assistant => "assistant-message",
            Role::System => "system-message",
            Role::Error => "error-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Extra display class appended to the role class.
    #[cfg_attr(feature = "serde", serde(default))]
    pub class: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            class: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoration {
    /// Avatar shown next to the message (an image URL or a short glyph).
    Avatar(String),
}

/// Everything a host needs to create the region for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub role: Role,
    /// Space-separated class list: `message <role>-message [extra]`.
    pub class: String,
    pub decoration: Option<Decoration>,
}

/// Creates output regions, typically by appending an element to the chat log.
pub trait RegionFactory {
    type Region: OutputRegion;

    fn create_region(&mut self, descriptor: &RegionDescriptor) -> Result<Self::Region, RegionError>;
}

impl<F: RegionFactory + ?Sized> RegionFactory for &mut F {
    type Region = F::Region;

    fn create_region(&mut self, descriptor: &RegionDescriptor) -> Result<Self::Region, RegionError> {
        (**self).create_region(descriptor)
    }
}

/// Produces [`MemoryRegion`]s and remembers the descriptors it was asked for.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegionFactory {
    created: Vec<RegionDescriptor>,
}

impl MemoryRegionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> &[RegionDescriptor] {
        &self.created
    }
}

impl RegionFactory for MemoryRegionFactory {
    type Region = MemoryRegion;

    fn create_region(&mut self, descriptor: &RegionDescriptor) -> Result<MemoryRegion, RegionError> {
        self.created.push(descriptor.clone());
        Ok(MemoryRegion::with_descriptor(descriptor.clone()))
    }
}

pub enum Presentation<R, M = ChatMarkdown> {
    /// Rendered in a single write.
    Static(R),
    /// The region is empty; drive `session` to reveal the message.
    Animated {
        region: R,
        session: PlaybackSession<M>,
    },
}

impl<R, M> Presentation<R, M> {
    pub fn region(&self) -> &R {
        match self {
            Presentation::Static(region) | Presentation::Animated { region, .. } => region,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Presentation::Animated { .. })
    }
}

#[derive(Debug, Clone)]
pub struct MessagePresenter<M = ChatMarkdown> {
    renderer: M,
    opts: PresenterOptions,
}

impl MessagePresenter<ChatMarkdown> {
    /// A presenter using the chat dialect configured by `opts.render`.
    pub fn new(opts: PresenterOptions) -> Self {
        Self {
            renderer: ChatMarkdown::new(opts.render.clone()),
            opts,
        }
    }
}

impl Default for MessagePresenter<ChatMarkdown> {
    fn default() -> Self {
        Self::new(PresenterOptions::default())
    }
}

impl<M: Markdown + Clone> MessagePresenter<M> {
    /// A presenter with a custom transformer. `opts.render` is ignored.
    pub fn with_renderer(renderer: M, opts: PresenterOptions) -> Self {
        Self { renderer, opts }
    }

    pub fn options(&self) -> &PresenterOptions {
        &self.opts
    }

    pub fn renderer(&self) -> &M {
        &self.renderer
    }

    pub fn animates(&self, role: Role) -> bool {
        role == Role::Assistant && self.opts.animate_assistant
    }

    pub fn region_descriptor(&self, message: &ChatMessage) -> RegionDescriptor {
        let mut class = format!("message {}", message.role.class_name());
        if let Some(extra) = message.class.as_deref().filter(|c| !c.trim().is_empty()) {
            class.push(' ');
            class.push_str(extra.trim());
        }
        let decoration = match message.role {
            Role::Assistant => self.opts.assistant_avatar.clone().map(Decoration::Avatar),
            _ => None,
        };
        RegionDescriptor {
            role: message.role,
            class,
            decoration,
        }
    }

    /// Create the region for `message` and either fill it or return a session that will.
    pub fn present<F: RegionFactory>(
        &self,
        factory: &mut F,
        message: ChatMessage,
    ) -> Result<Presentation<F::Region, M>, RegionError> {
        let descriptor = self.region_descriptor(&message);
        let mut region = factory.create_region(&descriptor)?;

        if !self.animates(message.role) {
            region.set_markup(&self.renderer.render(&message.text))?;
            tracing::debug!(role = message.role.as_str(), "message rendered");
            return Ok(Presentation::Static(region));
        }

        let session = PlaybackSession::new(
            message.text,
            self.renderer.clone(),
            self.opts.playback.clone(),
        );
        tracing::debug!(session = %session.id(), chars = session.len(), "message queued for playback");
        Ok(Presentation::Animated { region, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_messages_render_synchronously() {
        let presenter = MessagePresenter::default();
        let mut factory = MemoryRegionFactory::new();
        let presented = presenter
            .present(&mut factory, ChatMessage::user("**hi**"))
            .unwrap();

        assert!(!presented.is_animated());
        assert_eq!(presented.region().as_str(), render("**hi**"));
        assert_eq!(presented.region().writes(), 1);
        assert_eq!(factory.created()[0].class, "message user-message");
    }

    #[test]
    fn assistant_messages_get_a_session_and_avatar() {
        let presenter = MessagePresenter::new(PresenterOptions {
            assistant_avatar: Some("bot.png".to_string()),
            ..PresenterOptions::default()
        });
        let mut factory = MemoryRegionFactory::new();
        let presented = presenter
            .present(&mut factory, ChatMessage::assistant("hello").with_class("typing"))
            .unwrap();

        let Presentation::Animated { region, session } = presented else {
            panic!("assistant message should animate");
        };
        assert_eq!(region.writes(), 0);
        assert_eq!(session.source(), "hello");
        let descriptor = region.descriptor().unwrap();
        assert_eq!(descriptor.class, "message assistant-message typing");
        assert_eq!(descriptor.decoration, Some(Decoration::Avatar("bot.png".to_string())));
    }

    #[test]
    fn animation_can_be_disabled() {
        let presenter = MessagePresenter::new(PresenterOptions {
            animate_assistant: false,
            ..PresenterOptions::default()
        });
        let mut factory = MemoryRegionFactory::new();
        let presented = presenter
            .present(&mut factory, ChatMessage::assistant("- a\n- b"))
            .unwrap();
        assert_eq!(presented.region().as_str(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn error_messages_are_never_decorated() {
        let presenter = MessagePresenter::new(PresenterOptions {
            assistant_avatar: Some("bot.png".to_string()),
            ..PresenterOptions::default()
        });
        let descriptor = presenter.region_descriptor(&ChatMessage::new(Role::Error, "boom"));
        assert_eq!(descriptor.class, "message error-message");
        assert_eq!(descriptor.decoration, None);
    }
}
