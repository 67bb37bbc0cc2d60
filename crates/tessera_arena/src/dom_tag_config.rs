//! Tag and attribute tables for the browser platform.

use phf::phf_set;

pub static HTML_TAGS: phf::Set<&'static str> = phf_set! {
    "html", "body", "base", "head", "link", "meta", "style", "title", "address",
    "article", "aside", "footer", "header", "hgroup", "h1", "h2", "h3", "h4",
    "h5", "h6", "nav", "section", "div", "dd", "dl", "dt", "figcaption",
    "figure", "picture", "hr", "img", "li", "main", "ol", "p", "pre", "ul",
    "a", "b", "abbr", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em",
    "i", "kbd", "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span",
    "strong", "sub", "sup", "time", "u", "var", "wbr", "area", "audio", "map",
    "track", "video", "embed", "object", "param", "source", "canvas", "script",
    "noscript", "del", "ins", "caption", "col", "colgroup", "table", "thead",
    "tbody", "td", "th", "tr", "button", "datalist", "fieldset", "form",
    "input", "label", "legend", "meter", "optgroup", "option", "output",
    "progress", "select", "textarea", "details", "dialog", "menu", "summary",
    "template", "blockquote", "iframe", "tfoot", "search"
};

pub static SVG_TAGS: phf::Set<&'static str> = phf_set! {
    "svg", "animate", "animateMotion", "animateTransform", "audio", "canvas",
    "circle", "clipPath", "color-profile", "defs", "desc", "discard", "ellipse",
    "feBlend", "feColorMatrix", "feComponentTransfer", "feComposite",
    "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap",
    "feDistantLight", "feDropShadow", "feFlood", "feFuncA", "feFuncB",
    "feFuncG", "feFuncR", "feGaussianBlur", "feImage", "feMerge", "feMergeNode",
    "feMorphology", "feOffset", "fePointLight", "feSpecularLighting",
    "feSpotLight", "feTile", "feTurbulence", "filter", "foreignObject", "g",
    "hatch", "hatchpath", "image", "line", "linearGradient", "marker", "mask",
    "mesh", "meshgradient", "meshpatch", "meshrow", "metadata", "mpath",
    "path", "pattern", "polygon", "polyline", "radialGradient", "rect", "set",
    "solidcolor", "stop", "switch", "symbol", "text", "textPath", "title",
    "tspan", "unknown", "use", "view"
};

pub static MATH_TAGS: phf::Set<&'static str> = phf_set! {
    "annotation", "annotation-xml", "maction", "maligngroup", "malignmark",
    "math", "menclose", "merror", "mfenced", "mfrac", "mfraction", "mglyph",
    "mi", "mlabeledtr", "mlongdiv", "mmultiscripts", "mn", "mo", "mover",
    "mpadded", "mphantom", "mprescripts", "mroot", "mrow", "ms", "mscarries",
    "mscarry", "msgroup", "msline", "mspace", "msqrt", "msrow", "mstack",
    "mstyle", "msub", "msubsup", "msup", "mtable", "mtd", "mtext", "mtr",
    "munder", "munderover", "none", "semantics"
};

pub static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr"
};

/// Attributes whose presence alone means `true`.
pub static BOOLEAN_ATTRS: phf::Set<&'static str> = phf_set! {
    "itemscope", "allowfullscreen", "formnovalidate", "ismap", "nomodule",
    "novalidate", "readonly", "async", "autofocus", "autoplay", "controls",
    "default", "defer", "disabled", "hidden", "inert", "loop", "open",
    "required", "reversed", "scoped", "seamless", "checked", "muted",
    "multiple", "selected"
};

pub static KNOWN_HTML_ATTRS: phf::Set<&'static str> = phf_set! {
    "accept", "accept-charset", "accesskey", "action", "align", "allow", "alt",
    "async", "autocapitalize", "autocomplete", "autofocus", "autoplay",
    "background", "bgcolor", "border", "buffered", "capture", "challenge",
    "charset", "checked", "cite", "class", "code", "codebase", "color", "cols",
    "colspan", "content", "contenteditable", "contextmenu", "controls",
    "coords", "crossorigin", "csp", "data", "datetime", "decoding", "default",
    "defer", "dir", "dirname", "disabled", "download", "draggable", "dropzone",
    "enctype", "enterkeyhint", "for", "form", "formaction", "formenctype",
    "formmethod", "formnovalidate", "formtarget", "headers", "height",
    "hidden", "high", "href", "hreflang", "http-equiv", "icon", "id",
    "importance", "inert", "integrity", "ismap", "itemprop", "keytype", "kind",
    "label", "lang", "language", "loading", "list", "loop", "low", "manifest",
    "max", "maxlength", "minlength", "media", "min", "multiple", "muted",
    "name", "novalidate", "open", "optimum", "pattern", "ping", "placeholder",
    "poster", "preload", "radiogroup", "readonly", "referrerpolicy", "rel",
    "required", "reversed", "rows", "rowspan", "sandbox", "scope", "scoped",
    "selected", "shape", "size", "sizes", "slot", "span", "spellcheck", "src",
    "srcdoc", "srclang", "srcset", "start", "step", "style", "summary",
    "tabindex", "target", "title", "translate", "type", "usemap", "value",
    "width", "wrap"
};

pub static KNOWN_SVG_ATTRS: phf::Set<&'static str> = phf_set! {
    "xmlns", "xmlns:xlink", "xlink:href", "xml:space", "viewBox",
    "preserveAspectRatio", "class", "id", "style", "fill", "fill-opacity",
    "fill-rule", "stroke", "stroke-width", "stroke-linecap", "stroke-linejoin",
    "stroke-dasharray", "stroke-dashoffset", "stroke-miterlimit",
    "stroke-opacity", "opacity", "transform", "d", "points", "x", "y", "x1",
    "x2", "y1", "y2", "cx", "cy", "r", "rx", "ry", "width", "height",
    "offset", "stop-color", "stop-opacity", "gradientUnits",
    "gradientTransform", "clip-path", "clip-rule", "mask", "filter",
    "font-family", "font-size", "font-weight", "text-anchor", "dx", "dy",
    "href", "version", "visibility", "display", "color", "role", "focusable",
    "tabindex", "marker-start", "marker-mid", "marker-end", "pathLength",
    "patternUnits", "vector-effect", "dominant-baseline"
};

pub static KNOWN_MATH_ATTRS: phf::Set<&'static str> = phf_set! {
    "accent", "accentunder", "actiontype", "align", "class", "columnalign",
    "columnlines", "columnspacing", "denomalign", "depth", "dir", "display",
    "displaystyle", "fence", "frame", "height", "href", "id", "largeop",
    "linebreak", "lspace", "mathbackground", "mathcolor", "mathsize",
    "mathvariant", "maxsize", "minsize", "movablelimits", "notation",
    "numalign", "rowalign", "rowlines", "rowspacing", "rspace", "scriptlevel",
    "selection", "separator", "separators", "stretchy", "style", "subscriptshift",
    "superscriptshift", "symmetric", "width", "xmlns"
};

/// DOM property names whose attribute spelling differs.
pub static PROP_TO_ATTR: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "acceptCharset" => "accept-charset",
    "className" => "class",
    "htmlFor" => "for",
    "httpEquiv" => "http-equiv",
};

#[inline]
pub fn is_html_tag(tag: &str) -> bool {
    HTML_TAGS.contains(tag)
}

#[inline]
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(tag)
}

#[inline]
pub fn is_math_ml_tag(tag: &str) -> bool {
    MATH_TAGS.contains(tag)
}

#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// A tag the browser knows natively in any namespace.
#[inline]
pub fn is_native_tag(tag: &str) -> bool {
    is_html_tag(tag) || is_svg_tag(tag) || is_math_ml_tag(tag)
}

#[inline]
pub fn is_boolean_attr(name: &str) -> bool {
    BOOLEAN_ATTRS.contains(name)
}

/// Attribute names that are unsafe to render server-side.
pub fn is_ssr_safe_attr_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            matches!(
                c,
                '>' | '/' | '=' | '"' | '\'' | '\u{0009}' | '\u{000a}' | '\u{000c}' | ' '
            )
        })
}

pub fn is_known_html_attr(name: &str) -> bool {
    KNOWN_HTML_ATTRS.contains(name)
}

pub fn is_known_svg_attr(name: &str) -> bool {
    KNOWN_SVG_ATTRS.contains(name)
}

pub fn is_known_math_ml_attr(name: &str) -> bool {
    KNOWN_MATH_ATTRS.contains(name)
}

/// Elements whose content model the markup parser would rewrite.
#[inline]
pub fn is_table_section_tag(tag: &str) -> bool {
    matches!(tag, "caption" | "thead" | "tr" | "th" | "tbody" | "td" | "tfoot" | "colgroup" | "col")
}
