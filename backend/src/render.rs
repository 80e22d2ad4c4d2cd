// src/render.rs
use std::fmt::Write;

use crate::colors::Color;
use crate::cookies::Theme;
use crate::record::{Category, Record};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Text headed for a page. Only `TrustedMarkup` reaches the page unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    PlainText(String),
    TrustedMarkup(String),
}

impl Markup {
    pub fn render(&self) -> String {
        match self {
            Markup::PlainText(text) => html_escape(text),
            Markup::TrustedMarkup(markup) => markup.clone(),
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub struct QuestionPage {
    pub theme: Theme,
    pub question: Markup,
    pub answer: Markup,
    pub category: Category,
    pub color: Color,
    pub settings_link: bool,
}

impl QuestionPage {
    /// `trusted` renders record text as markup instead of escaping it.
    pub fn for_record(record: &Record, color: Color, trusted: bool) -> Self {
        let wrap = |s: &str| {
            if trusted {
                Markup::TrustedMarkup(s.to_string())
            } else {
                Markup::PlainText(s.to_string())
            }
        };

        QuestionPage {
            theme: Theme::default(),
            question: wrap(&record.question),
            answer: wrap(&record.answer),
            category: record.category.clone(),
            color,
            settings_link: false,
        }
    }

    pub fn nothing_loaded(color: Color) -> Self {
        QuestionPage {
            theme: Theme::default(),
            question: Markup::PlainText("How do I load questions into Trivia?".to_string()),
            answer: Markup::TrustedMarkup(
                "See <a id=\"help\" href=\"https://github.com/Seednode/trivia?tab=readme-ov-file#file-format\">the docs</a>."
                    .to_string(),
            ),
            category: Category::from("Usage"),
            color,
            settings_link: false,
        }
    }

    pub fn not_found(color: Color) -> Self {
        QuestionPage {
            theme: Theme::default(),
            question: Markup::PlainText("Are you sure this URL is correct?".to_string()),
            answer: Markup::TrustedMarkup(
                "If not, please go back to the <a id=\"help\" href=\"/\">homepage</a> and try again."
                    .to_string(),
            ),
            category: Category::from("Error"),
            color,
            settings_link: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_settings_link(mut self, settings_link: bool) -> Self {
        self.settings_link = settings_link;
        self
    }

    pub fn content_security_policy(&self) -> String {
        format!(
            "default-src 'self'; style-src-elem 'self' {}",
            self.color.csp_source()
        )
    }

    pub fn render(&self) -> String {
        let settings = if self.settings_link {
            "<p id=\"settings-link\"><a href=\"/settings\">Settings</a></p>"
        } else {
            ""
        };

        // The <style> body must match the fragment hashed into the CSP header byte for byte.
        format!(
            r#"<!DOCTYPE html>
<html lang="en-US">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <meta name="Description" content="A very basic trivia webapp." />
    <title>Trivia v{version}</title>
    <link rel="stylesheet" href="/css/{theme}.css" />
    <link rel="stylesheet" href="/css/trivia.css" />
    <style>{style}</style>
    <script src="/js/toggleAnswer.js" defer></script>
  </head>
  <body>
  {settings}
    <p id="hint">(Click on the question to load a new one)</p>
    <a href="/"><p id="question">{question}</p></a>
    <button id="toggle-answer">Show Answer</button>
    <div id="answer"><p>{answer}</p></div>
    <div class="footer"><p>{category}</p></div>
  </body>
</html>"#,
            version = VERSION,
            theme = self.theme.as_str(),
            style = self.color.style_fragment(),
            settings = settings,
            question = self.question.render(),
            answer = self.answer.render(),
            category = html_escape(self.category.as_str()),
        )
    }
}

pub fn render_settings(theme: Theme, categories: &[Category], selected: &[Category]) -> String {
    let mut toggles = String::new();
    for category in categories {
        let name = html_escape(category.as_str());
        let checked = if selected.contains(category) { " checked" } else { "" };
        let _ = writeln!(
            toggles,
            "          <li><label><input type=\"checkbox\" name=\"{name}\"{checked}>{name}</label></li>"
        );
    }

    let (light, dark) = match theme {
        Theme::Light => (" checked", ""),
        Theme::Dark => ("", " checked"),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en-US">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Trivia v{version}</title>
    <script src="/js/settings.js" defer></script>
    <link rel="stylesheet" href="/css/{theme}.css" />
    <link rel="stylesheet" href="/css/trivia.css" />
  </head>
  <body>
    <p id="settings-link"><a href="/">Back to homepage</a></p>
    <div class="settings-container">
      <div class="settings-item">
        <div class="settings-scrollable">
          <h2>Categories</h2>
          <ul>
{toggles}          </ul>
          <input id="set-categories" type="submit"></input>
        </div>
      </div>
      <div class="settings-item">
        <h2>Theme</h2>
        <input type="radio" id="light-mode" name="theme" value="lightMode"{light} />
        <label for="light-mode">Light mode</label><br />
        <input type="radio" id="dark-mode" name="theme" value="darkMode"{dark} />
        <label for="dark-mode">Dark mode</label><br />
        <input id="set-theme" type="submit"></input>
      </div>
    </div>
  </body>
</html>"#,
        version = VERSION,
        theme = theme.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_escaped_markup_is_not() {
        assert_eq!(
            Markup::PlainText("<b>A & B</b>".to_string()).render(),
            "&lt;b&gt;A &amp; B&lt;/b&gt;"
        );
        assert_eq!(
            Markup::TrustedMarkup("<b>A</b>".to_string()).render(),
            "<b>A</b>"
        );
    }

    #[test]
    fn record_text_is_escaped_unless_trusted() {
        let record = Record::new("<i>Q</i>", "A", Category::from("Science & Nature"));

        let page = QuestionPage::for_record(&record, Color::default_color(), false).render();
        assert!(page.contains("&lt;i&gt;Q&lt;/i&gt;"));
        assert!(page.contains("Science &amp; Nature"));

        let page = QuestionPage::for_record(&record, Color::default_color(), true).render();
        assert!(page.contains("<i>Q</i>"));
    }

    #[test]
    fn style_block_matches_hashed_fragment() {
        let color = Color::new("#123456");
        let page = QuestionPage::not_found(color.clone());

        assert!(page.render().contains(&format!("<style>{}</style>", color.style_fragment())));
        assert!(page.content_security_policy().ends_with(&format!("'sha256-{}'", color.hash)));
    }

    #[test]
    fn settings_marks_selected_categories() {
        let categories = vec![Category::from("Art"), Category::from("History")];
        let html = render_settings(Theme::Light, &categories, &[Category::from("History")]);

        assert!(html.contains("name=\"History\" checked>"));
        assert!(html.contains("name=\"Art\">"));
        assert!(html.contains("value=\"lightMode\" checked"));
    }
}
