/// Starter `.px2vw.toml` written by `px2vw --init`.
pub fn generate_init_template() -> String {
	r#"# px2vw configuration
# Values shown are the defaults.

# Unit to look for, and the design width it is relative to.
unit-to-convert = "px"
viewport-width = 320
unit-precision = 5
min-pixel-value = 1

# Units written out.
viewport-unit = "vw"
font-viewport-unit = "vw"

# Properties to convert. "!" excludes, "*" is a wildcard.
prop-list = ["*"]

# Selectors to leave alone: plain strings match substrings,
# { regex = "..." } tables are regular expressions.
selector-black-list = []

# false keeps the original declaration and appends the converted one.
replace = true

# true, false, or patterns matched against media conditions.
media-query = false

# Append an @media (orientation: landscape) block.
landscape = false
landscape-unit = "vw"
landscape-width = 568

# Only convert matching files / skip matching files.
# include = { regex = "/mobile/" }
# exclude = [{ regex = "node_modules" }]

# Per-property overrides. Placeholders: {pixels}, {value}, {prop}.
# [[rules]]
# test = "border-width"
# value = "{pixels}px"
"#
	.to_string()
}
