//! Directive recognition.
//!
//! Directives are read from attribute names on every pass; nothing about
//! them is cached on the element.

use super::config::BinderConfig;

/// What an attribute means to the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// Display expression; its value replaces the element's content.
    Display { expression: &'a str },
    /// Event handler; the event type is the attribute name minus the prefix.
    Event {
        event_type: &'a str,
        handler: &'a str,
    },
    /// The bare prefix with no event type.
    Malformed { attribute: &'a str },
}

/// Classify one attribute, or `None` if it is not a directive.
pub fn classify<'a>(name: &'a str, value: &'a str, config: &BinderConfig) -> Option<Directive<'a>> {
    if name == config.display_attribute {
        return Some(Directive::Display { expression: value });
    }
    let event_type = name.strip_prefix(config.event_prefix.as_str())?;
    if event_type.is_empty() {
        return Some(Directive::Malformed { attribute: name });
    }
    Some(Directive::Event {
        event_type,
        handler: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_attribute_wins_over_prefix() {
        let config = BinderConfig::default();
        assert_eq!(
            classify("@data", "count", &config),
            Some(Directive::Display { expression: "count" })
        );
    }

    #[test]
    fn event_type_is_taken_verbatim() {
        let config = BinderConfig::default();
        assert_eq!(
            classify("@my-custom:event", "x = 1", &config),
            Some(Directive::Event {
                event_type: "my-custom:event",
                handler: "x = 1",
            })
        );
        assert_eq!(
            classify("@dataset", "x", &config),
            Some(Directive::Event {
                event_type: "dataset",
                handler: "x",
            })
        );
    }

    #[test]
    fn bare_prefix_is_malformed() {
        let config = BinderConfig::default();
        assert_eq!(
            classify("@", "x", &config),
            Some(Directive::Malformed { attribute: "@" })
        );
    }

    #[test]
    fn ordinary_attributes_are_ignored() {
        let config = BinderConfig::default();
        assert_eq!(classify("class", "big", &config), None);
        assert_eq!(classify("data", "x", &config), None);
    }

    #[test]
    fn custom_names() {
        let config = BinderConfig {
            display_attribute: "g-text".into(),
            event_prefix: "on:".into(),
            ..BinderConfig::default()
        };
        assert_eq!(
            classify("g-text", "a", &config),
            Some(Directive::Display { expression: "a" })
        );
        assert_eq!(
            classify("on:click", "b", &config),
            Some(Directive::Event {
                event_type: "click",
                handler: "b",
            })
        );
        assert_eq!(classify("@click", "c", &config), None);
    }
}
