//! Conservative description cleaning shared by query normalization and
//! context gathering: only obvious reply history, confidentiality footers,
//! and signature blocks are removed.

use std::sync::OnceLock;

use regex::Regex;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
	cell.get_or_init(|| Regex::new(pattern).expect("text regex must compile"))
}

fn reply_marker_res() -> &'static [Regex] {
	static MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();

	MARKERS.get_or_init(|| {
		[
			r"(?i)^\s*On .+ wrote:\s*$",
			r"(?i)^\s*-{5,}\s*Original Message\s*-{5,}\s*$",
			r"(?i)^\s*From:\s+.+$",
		]
		.iter()
		.map(|pattern| Regex::new(pattern).expect("text regex must compile"))
		.collect()
	})
}

/// Collapse runs of blank lines and trailing whitespace.
pub fn normalize_ws(raw: &str) -> String {
	static BLANKS: OnceLock<Regex> = OnceLock::new();

	let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
	let collapsed = regex(&BLANKS, r"\n\s*\n\s*\n+").replace_all(&unified, "\n\n");

	collapsed.lines().map(str::trim_end).collect::<Vec<_>>().join("\n").trim().to_string()
}

/// A `From:` line only counts as a reply header when it sits in a bundle of
/// mail headers; bare "From:" sentences stay.
fn looks_like_header_bundle(lines: &[&str], start: usize) -> bool {
	let window =
		lines[start..lines.len().min(start + 6)].join("\n").to_lowercase();

	["from:", "sent:", "to:", "subject:"].iter().filter(|k| window.contains(**k)).count() >= 3
}

fn cut_reply_history(text: &str) -> String {
	let lines: Vec<&str> = text.lines().collect();

	for (i, line) in lines.iter().enumerate() {
		if reply_marker_res().iter().any(|re| re.is_match(line)) {
			if line.trim_start().to_lowercase().starts_with("from:")
				&& !looks_like_header_bundle(&lines, i)
			{
				continue;
			}

			return lines[..i].join("\n").trim_end().to_string();
		}
	}

	text.to_string()
}

fn strip_confidentiality(text: &str) -> String {
	static FOOTER: OnceLock<Regex> = OnceLock::new();

	let re = regex(
		&FOOTER,
		r"(?i)(confidential|privileged|intended only for|unauthorized|disclosure|legal disclaimer)",
	);

	match re.find(text) {
		Some(m) => text[..m.start()].trim_end().to_string(),
		None => text.to_string(),
	}
}

fn strip_signature_block(text: &str) -> String {
	static SIGNOFF: OnceLock<Regex> = OnceLock::new();
	static CONTACTISH: OnceLock<Regex> = OnceLock::new();

	let signoff =
		regex(&SIGNOFF, r"(?i)^\s*(thanks|thank you|regards|best|sincerely|cheers),?\s*$");
	let contactish = regex(
		&CONTACTISH,
		r"(?i)(@|\bhttps?://|\bwww\.|tel[:\s]|phone|cell|mobile|fax|\.com\b|llc\b|inc\b|cto\b|ceo\b|manager\b|director\b)",
	);
	let lines: Vec<&str> = text.lines().collect();

	for i in (0..lines.len()).rev() {
		if signoff.is_match(lines[i].trim()) {
			let tail = &lines[i + 1..lines.len().min(i + 9)];
			let contact_lines = tail.iter().filter(|line| contactish.is_match(line)).count();

			if contact_lines >= 2 {
				return lines[..i].join("\n").trim_end().to_string();
			}
		}
	}

	text.to_string()
}

/// Strip markup and decode the handful of entities the helpdesk emits.
/// Block boundaries become spaces; inline tags vanish so punctuation after
/// a closing tag stays attached to its word.
pub fn html_to_text(html: &str) -> String {
	static TAGS: OnceLock<Regex> = OnceLock::new();
	static BREAKS: OnceLock<Regex> = OnceLock::new();
	static INLINE: OnceLock<Regex> = OnceLock::new();

	if html.is_empty() {
		return String::new();
	}

	let stripped = regex(&TAGS, r"(?is)<(script|style)\b.*?</(script|style)>").replace_all(html, " ");
	let stripped = regex(&BREAKS, r"(?i)<(br|hr|/?(p|div|li|ul|ol|tr|td|th|table|h[1-6]|blockquote))\b[^>]*>")
		.replace_all(&stripped, " ");
	let stripped = regex(&INLINE, r"<[^>]*>").replace_all(&stripped, "");
	let decoded = stripped
		.replace("&nbsp;", " ")
		.replace("&amp;", "&")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'");

	decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Full cleaning pipeline for ticket descriptions. Subjects should not be
/// passed through here.
pub fn clean_description(raw: &str) -> String {
	let mut text = normalize_ws(raw);

	text = cut_reply_history(&text);
	text = strip_confidentiality(&text);
	text = strip_signature_block(&text);

	normalize_ws(&text)
}

/// Character-count truncation with an ellipsis marker.
pub fn truncate_chars(text: &str, limit: usize) -> String {
	if text.chars().count() <= limit {
		return text.to_string();
	}

	let kept: String = text.chars().take(limit.saturating_sub(1)).collect();

	format!("{}…", kept.trim_end())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cuts_reply_history_at_wrote_marker() {
		let raw = "Revit crashes on startup.\n\nOn Tue, Jan 2 John wrote:\n> old thread";

		assert_eq!(clean_description(raw), "Revit crashes on startup.");
	}

	#[test]
	fn keeps_bare_from_sentences() {
		let raw = "From: the error dialog it looks like a license issue.";

		assert_eq!(clean_description(raw), raw);
	}

	#[test]
	fn cuts_header_bundles() {
		let raw = "New failure today.\nFrom: helpdesk@example.com\nSent: Monday\nTo: it@example.com\nSubject: RE: printer";

		assert_eq!(clean_description(raw), "New failure today.");
	}

	#[test]
	fn strips_confidentiality_footer() {
		let raw = "VPN drops every hour.\n\nCONFIDENTIALITY NOTICE: intended only for the recipient.";

		assert_eq!(clean_description(raw), "VPN drops every hour.");
	}

	#[test]
	fn strips_signature_with_contact_lines() {
		let raw = "Outlook will not sync.\n\nThanks,\nJane Doe\njane@example.com\nPhone: 555-0100";

		assert_eq!(clean_description(raw), "Outlook will not sync.");
	}

	#[test]
	fn keeps_signoff_without_contact_block() {
		let raw = "Outlook will not sync.\n\nThanks,\nJane";

		assert_eq!(clean_description(raw), raw);
	}

	#[test]
	fn html_to_text_strips_tags_and_entities() {
		let html = "<div><p>Teams &amp; Outlook</p><script>var x = 1;</script> crash</div>";

		assert_eq!(html_to_text(html), "Teams & Outlook crash");
	}

	#[test]
	fn inline_tags_keep_punctuation_attached() {
		assert_eq!(html_to_text("<div>Queue is <i>stuck</i>.</div>"), "Queue is stuck.");
		assert_eq!(html_to_text("<p>one</p><p>two</p>"), "one two");
	}

	#[test]
	fn truncation_appends_ellipsis() {
		assert_eq!(truncate_chars("short", 10), "short");

		let truncated = truncate_chars(&"a".repeat(20), 10);

		assert_eq!(truncated.chars().count(), 10);
		assert!(truncated.ends_with('…'));
	}
}
