// Per-context encode sets, each built by layering onto a narrower one, the
// same way the WHATWG URL Standard defines them (each set is stated as
// "the X percent-encode set plus these additional code points").

/// The C0 control percent-encode set: the C0 controls and all non-ASCII
/// bytes (non-ASCII handled generically by `AsciiSet::should_percent_encode`).
pub const CONTROLS: AsciiSet = AsciiSet::named("controls")
    .add(0x00).add(0x01).add(0x02).add(0x03).add(0x04).add(0x05).add(0x06).add(0x07)
    .add(0x08).add(0x09).add(0x0A).add(0x0B).add(0x0C).add(0x0D).add(0x0E).add(0x0F)
    .add(0x10).add(0x11).add(0x12).add(0x13).add(0x14).add(0x15).add(0x16).add(0x17)
    .add(0x18).add(0x19).add(0x1A).add(0x1B).add(0x1C).add(0x1D).add(0x1E).add(0x1F)
    .add(0x7F);

/// The fragment percent-encode set: C0 controls, space, `"`, `<`, `>`, `` ` ``.
pub const FRAGMENT: AsciiSet = CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// The query percent-encode set (non-special schemes): C0 controls, space,
/// `"`, `#`, `<`, `>`.
pub const QUERY: AsciiSet = CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>');

/// The special-query percent-encode set: the query set plus `'`.
pub const SPECIAL_QUERY: AsciiSet = QUERY.add(b'\'');

/// The path percent-encode set: the query set plus `?`, `` ` ``, `{`, `}`.
pub const PATH: AsciiSet = QUERY.add(b'?').add(b'`').add(b'{').add(b'}');

/// The userinfo percent-encode set: the path set plus
/// `/`, `:`, `;`, `=`, `@`, `[`, `\`, `]`, `^`, `|`.
pub const USERINFO: AsciiSet = PATH
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|');

/// The component percent-encode set: the userinfo set plus
/// `$`, `%`, `&`, `+`, `,`.
pub const COMPONENT: AsciiSet = USERINFO
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',');

/// The `application/x-www-form-urlencoded` percent-encode set.
pub const FORM_URLENCODED: AsciiSet = ascii_set::form_urlencoded_percent_encode_set("form-urlencoded");
