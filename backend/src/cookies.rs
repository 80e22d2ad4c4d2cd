// src/cookies.rs
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::TriviaError;
use crate::record::Category;

type HmacSha256 = Hmac<Sha256>;

pub const CATEGORIES_COOKIE: &str = "enabledCategories";
pub const THEME_COOKIE: &str = "colorTheme";

const SIGNATURE_LEN: usize = 32;
const MAX_AGE_SECS: i64 = 31_556_952;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Anything other than `lightMode` is dark.
    pub fn parse(value: &str) -> Self {
        if value == "lightMode" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "lightMode",
            Theme::Dark => "darkMode",
        }
    }
}

/// Signs preference cookies so clients can't forge them.
///
/// Wire format: base64url(HMAC-SHA256(secret, name ‖ value) ‖ value).
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
    secure: bool,
}

impl CookieSigner {
    pub fn new(secret: &[u8], secure: bool) -> Result<Self, TriviaError> {
        let mac = <HmacSha256 as KeyInit>::new_from_slice(secret)
            .map_err(|_| TriviaError::InvalidSecret)?;
        Ok(CookieSigner { mac, secure })
    }

    /// Keyed with fresh random bytes; cookies don't survive a restart.
    pub fn random(secure: bool) -> Result<Self, TriviaError> {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        CookieSigner::new(&secret, secure)
    }

    fn keyed(&self, name: &str, value: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.update(value);
        mac
    }

    pub fn encode(&self, name: &str, value: &str) -> String {
        let mut payload = self.keyed(name, value.as_bytes()).finalize().into_bytes().to_vec();
        payload.extend_from_slice(value.as_bytes());
        URL_SAFE.encode(payload)
    }

    /// `None` for anything undecodable, truncated, or wrongly signed.
    pub fn decode(&self, name: &str, raw: &str) -> Option<String> {
        let payload = URL_SAFE.decode(raw).ok()?;
        if payload.len() < SIGNATURE_LEN {
            return None;
        }

        let (signature, value) = payload.split_at(SIGNATURE_LEN);
        self.keyed(name, value).verify_slice(signature).ok()?;
        String::from_utf8(value.to_vec()).ok()
    }

    pub fn cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        Cookie::build(name.to_string(), self.encode(name, value))
            .path("/")
            .max_age(Duration::seconds(MAX_AGE_SECS))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .finish()
    }

    pub fn read(&self, req: &HttpRequest, name: &str) -> Option<String> {
        let cookie = req.cookie(name)?;
        self.decode(name, cookie.value())
    }

    pub fn theme(&self, req: &HttpRequest) -> Theme {
        self.read(req, THEME_COOKIE)
            .map(|value| Theme::parse(&value))
            .unwrap_or_default()
    }

    /// Empty means "no preference", i.e. every category.
    pub fn enabled_categories(&self, req: &HttpRequest) -> Vec<Category> {
        self.read(req, CATEGORIES_COOKIE)
            .map(|value| {
                value
                    .split(',')
                    .filter(|c| !c.is_empty())
                    .map(Category::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
