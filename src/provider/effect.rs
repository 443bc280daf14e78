//! Closed effect and style enumerations plus the static endpoint table.

// self
use crate::_prelude::*;

/// Image transformations exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
	/// Colorize a black-and-white photo.
	Colorize,
	/// Artistic style transfer, parameterized by [`Style`].
	StyleTransfer,
	/// Portrait to anime conversion.
	Anime,
	/// Lossless upscaling.
	Upscale,
	/// Haze removal.
	Dehaze,
	/// Contrast enhancement.
	Contrast,
	/// Stretched-image restoration.
	Stretch,
	/// Definition (sharpness) enhancement.
	Sharpen,
	/// Color enhancement.
	ColorEnhance,
}
impl Effect {
	/// Every supported effect in catalog order.
	pub const ALL: [Effect; 9] = [
		Effect::Colorize,
		Effect::Anime,
		Effect::StyleTransfer,
		Effect::Upscale,
		Effect::Dehaze,
		Effect::Contrast,
		Effect::Stretch,
		Effect::Sharpen,
		Effect::ColorEnhance,
	];

	/// Returns the wire name accepted in requests.
	pub const fn as_str(self) -> &'static str {
		match self {
			Effect::Colorize => "colorize",
			Effect::StyleTransfer => "styleTransfer",
			Effect::Anime => "anime",
			Effect::Upscale => "upscale",
			Effect::Dehaze => "dehaze",
			Effect::Contrast => "contrast",
			Effect::Stretch => "stretch",
			Effect::Sharpen => "sharpen",
			Effect::ColorEnhance => "colorEnhance",
		}
	}

	/// Provider path (relative to the REST base) that performs the effect.
	pub const fn endpoint_path(self) -> &'static str {
		match self {
			Effect::Colorize => "/rest/2.0/image-process/v1/colourize",
			Effect::StyleTransfer => "/rest/2.0/image-process/v1/style_trans",
			Effect::Anime => "/rest/2.0/image-process/v1/selfie_anime",
			Effect::Upscale => "/rest/2.0/image-process/v1/image_quality_enhance",
			Effect::Dehaze => "/rest/2.0/image-process/v1/dehaze",
			Effect::Contrast => "/rest/2.0/image-process/v1/contrast_enhance",
			Effect::Stretch => "/rest/2.0/image-process/v1/stretch_restore",
			Effect::Sharpen => "/rest/2.0/image-process/v1/image_definition_enhance",
			Effect::ColorEnhance => "/rest/2.0/image-process/v1/color_enhance",
		}
	}

	/// UI grouping the effect is listed under.
	pub const fn category(self) -> EffectCategory {
		match self {
			Effect::Colorize | Effect::Anime => EffectCategory::Effects,
			Effect::StyleTransfer => EffectCategory::Styles,
			Effect::Upscale
			| Effect::Dehaze
			| Effect::Contrast
			| Effect::Stretch
			| Effect::Sharpen
			| Effect::ColorEnhance => EffectCategory::Enhancement,
		}
	}

	/// Returns `true` when the effect takes a [`Style`] option.
	pub const fn takes_style(self) -> bool {
		matches!(self, Effect::StyleTransfer)
	}
}
impl Display for Effect {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Effect {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Effect::ALL
			.into_iter()
			.find(|effect| effect.as_str() == s)
			.ok_or_else(|| Error::UnsupportedEffect { name: s.to_owned() })
	}
}

/// Catalog grouping mirrored by the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
	/// Creative effects (colorize, anime).
	Effects,
	/// Style transfer.
	Styles,
	/// Quality enhancement.
	Enhancement,
}
impl EffectCategory {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			EffectCategory::Effects => "effects",
			EffectCategory::Styles => "styles",
			EffectCategory::Enhancement => "enhancement",
		}
	}
}

/// Styles accepted by [`Effect::StyleTransfer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
	/// Cartoon drawing.
	#[default]
	Cartoon,
	/// Pencil drawing.
	Pencil,
	/// Color pencil drawing.
	ColorPencil,
	/// Gothic oil painting.
	Gothic,
	/// Candy-colored oil painting.
	Candy,
	/// "The Scream" oil painting.
	Scream,
	/// "The Great Wave" woodblock print.
	Wave,
	/// Wonder oil painting.
	Wonder,
	/// Lavender oil painting.
	Lavender,
}
impl Style {
	/// Every supported style in catalog order.
	pub const ALL: [Style; 9] = [
		Style::Cartoon,
		Style::Pencil,
		Style::ColorPencil,
		Style::Gothic,
		Style::Candy,
		Style::Scream,
		Style::Wave,
		Style::Wonder,
		Style::Lavender,
	];

	/// Returns the provider `option` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Style::Cartoon => "cartoon",
			Style::Pencil => "pencil",
			Style::ColorPencil => "color_pencil",
			Style::Gothic => "gothic",
			Style::Candy => "candy",
			Style::Scream => "scream",
			Style::Wave => "wave",
			Style::Wonder => "wonder",
			Style::Lavender => "lavender",
		}
	}
}
impl Display for Style {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Style {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		// The front end keys this style as `colorPencil`.
		if s == "colorPencil" {
			return Ok(Style::ColorPencil);
		}

		Style::ALL
			.into_iter()
			.find(|style| style.as_str() == s)
			.ok_or_else(|| Error::InvalidOption { option: "style", value: s.to_owned() })
	}
}

/// A validated effect invocation, ready to be forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectCall {
	/// Effect to apply.
	pub effect: Effect,
	/// Style option; populated only for [`Effect::StyleTransfer`].
	pub style: Option<Style>,
}
impl EffectCall {
	/// Validates the caller-supplied effect name and style.
	///
	/// A missing or empty style falls back to [`Style::Cartoon`]. The style is ignored for every
	/// effect other than style transfer.
	pub fn resolve(effect: &str, style: Option<&str>) -> Result<Self> {
		let effect = effect.parse::<Effect>()?;
		let style = if effect.takes_style() {
			match style.filter(|value| !value.is_empty()) {
				Some(value) => Some(value.parse::<Style>()?),
				None => Some(Style::default()),
			}
		} else {
			None
		};

		Ok(Self { effect, style })
	}

	/// Builds the provider form body for `image`.
	pub fn form(&self, image: &str) -> Vec<(&'static str, String)> {
		let mut form = vec![("image", image.to_owned())];

		if let Some(style) = self.style {
			form.push(("option", style.as_str().to_owned()));
		}

		form
	}
}

/// Machine-readable listing of the supported effects and styles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectCatalog {
	/// Effects in catalog order.
	pub effects: Vec<EffectEntry>,
	/// Style names accepted by style transfer.
	pub styles: Vec<&'static str>,
	/// Style applied when none is given.
	pub default_style: &'static str,
}
impl EffectCatalog {
	/// Builds the catalog from the static tables.
	pub fn new() -> Self {
		Self {
			effects: Effect::ALL
				.into_iter()
				.map(|effect| EffectEntry {
					name: effect.as_str(),
					category: effect.category().as_str(),
					endpoint: effect.endpoint_path(),
				})
				.collect(),
			styles: Style::ALL.into_iter().map(Style::as_str).collect(),
			default_style: Style::default().as_str(),
		}
	}
}
impl Default for EffectCatalog {
	fn default() -> Self {
		Self::new()
	}
}

/// One catalog row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EffectEntry {
	/// Wire name.
	pub name: &'static str,
	/// UI grouping.
	pub category: &'static str,
	/// Provider path.
	pub endpoint: &'static str,
}
