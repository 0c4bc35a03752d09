use crate::config::PathRemap;
use crate::error::Result;
use crate::pipeline::{LineContext, Rule, RuleError};
use crate::rules::compile_regex;
use regex::{Captures, Regex};

/// Rewrites Liquid link tags into Pelican's intra-site link placeholders.
///
/// All tags on a line are rewritten in one claim:
/// - `{% post_url NAME %}` -> `{filename}/PREFIX NAME.md`
/// - `{% link PATH %}` -> `{filename}/PATH`
/// - `{{ site.url }}PATH` -> `{static}PATH`, or `{index}` without a path
#[derive(Debug)]
pub struct LinkRule {
	post_prefix: String,
	static_paths: Vec<PathRemap>,
	post_url_re: Regex,
	empty_post_url_re: Regex,
	link_re: Regex,
	site_re: Regex,
}

impl LinkRule {
	pub fn new(post_prefix: &str, static_paths: Vec<PathRemap>) -> Result<Self> {
		Ok(LinkRule {
			post_prefix: post_prefix.trim_matches('/').to_string(),
			static_paths,
			post_url_re: compile_regex(r"\{%-?\s*post_url\s+([^\s%]+)\s*-?%\}")?,
			empty_post_url_re: compile_regex(r"\{%-?\s*post_url\s*-?%\}")?,
			link_re: compile_regex(r"\{%-?\s*link\s+([^\s%]+)\s*-?%\}")?,
			site_re: compile_regex(
				r#"(?:\{\{-?\s*site\.(?:url|baseurl)\s*-?\}\})+([^\s)"'<>\]]*)"#,
			)?,
		})
	}

	fn post_target(&self, name: &str) -> String {
		let name = name.trim_start_matches('/');
		let name = name.strip_suffix(".md").unwrap_or(name);
		if self.post_prefix.is_empty() {
			format!("{{filename}}/{name}.md")
		} else {
			format!("{{filename}}/{}/{name}.md", self.post_prefix)
		}
	}

	fn static_target(&self, path: &str) -> String {
		// `{{ site.baseurl }}{% post_url x %}` was already rewritten above
		if path.starts_with('{') {
			return path.to_string();
		}
		if path.is_empty() || path == "/" {
			return "{index}".to_string();
		}

		let remapped = self
			.static_paths
			.iter()
			.find_map(|remap| {
				path.strip_prefix(remap.from.as_str())
					.map(|rest| format!("{}{rest}", remap.to))
			})
			.unwrap_or_else(|| path.to_string());
		format!("{{static}}{remapped}")
	}
}

impl Rule for LinkRule {
	fn name(&self) -> &'static str {
		"links"
	}

	fn evaluate(
		&self,
		line: &str,
		_ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		if let Some(tag) = self.empty_post_url_re.find(line) {
			return Err(RuleError::new(format!(
				"'{}' has no post name",
				tag.as_str()
			)));
		}

		let rewritten = self
			.post_url_re
			.replace_all(line, |caps: &Captures| self.post_target(&caps[1]));
		let rewritten = self.link_re.replace_all(&rewritten, |caps: &Captures| {
			let path = caps[1].trim_start_matches('/');
			let path = path.strip_prefix("_posts/").unwrap_or(path);
			format!("{{filename}}/{path}")
		});
		let rewritten = self
			.site_re
			.replace_all(&rewritten, |caps: &Captures| self.static_target(&caps[1]));

		if rewritten == line {
			Ok(None)
		} else {
			Ok(Some(rewritten.into_owned()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rule() -> LinkRule {
		LinkRule::new(
			"",
			vec![PathRemap {
				from: "/resources/".to_string(),
				to: "/images/".to_string(),
			}],
		)
		.unwrap()
	}

	fn eval(rule: &LinkRule, line: &str) -> Option<String> {
		rule.evaluate(line, &LineContext::new()).unwrap()
	}

	#[test]
	fn test_post_url() {
		assert_eq!(
			eval(&rule(), "{% post_url 2023-01-05-my-post %}"),
			Some("{filename}/2023-01-05-my-post.md".to_string())
		);
	}

	#[test]
	fn test_post_url_inside_markdown_link() {
		assert_eq!(
			eval(&rule(), "See [my post]({%post_url   2023-01-05-my-post%}) too."),
			Some("See [my post]({filename}/2023-01-05-my-post.md) too.".to_string())
		);
	}

	#[test]
	fn test_post_url_with_prefix() {
		let rule = LinkRule::new("/articles/", vec![]).unwrap();
		assert_eq!(
			eval(&rule, "[a]({% post_url 2023-01-05-a %})"),
			Some("[a]({filename}/articles/2023-01-05-a.md)".to_string())
		);
	}

	#[test]
	fn test_multiple_tags_on_one_line() {
		assert_eq!(
			eval(
				&rule(),
				"[a]({% post_url a %}) and ![b]({{ site.url }}/resources/b.png)"
			),
			Some("[a]({filename}/a.md) and ![b]({static}/images/b.png)".to_string())
		);
	}

	#[test]
	fn test_post_url_without_name_is_error() {
		let result = rule().evaluate("[x]({% post_url %})", &LineContext::new());
		assert!(result.unwrap_err().message.contains("no post name"));
	}

	#[test]
	fn test_link_tag() {
		assert_eq!(
			eval(&rule(), "[x]({% link _posts/2016-07-26-name.md %})"),
			Some("[x]({filename}/2016-07-26-name.md)".to_string())
		);
		assert_eq!(
			eval(&rule(), "[about]({% link about.md %})"),
			Some("[about]({filename}/about.md)".to_string())
		);
	}

	#[test]
	fn test_site_url_static() {
		assert_eq!(
			eval(&rule(), "![img]({{site.url}}/files/a.pdf)"),
			Some("![img]({static}/files/a.pdf)".to_string())
		);
	}

	#[test]
	fn test_site_url_without_path_is_index() {
		assert_eq!(
			eval(&rule(), "[home]({{ site.url }})"),
			Some("[home]({index})".to_string())
		);
		assert_eq!(
			eval(&rule(), "[home]({{ site.baseurl }}/)"),
			Some("[home]({index})".to_string())
		);
	}

	#[test]
	fn test_baseurl_before_post_url() {
		assert_eq!(
			eval(&rule(), "[a]({{ site.baseurl }}{% post_url a %})"),
			Some("[a]({filename}/a.md)".to_string())
		);
	}

	#[test]
	fn test_stacked_site_variables() {
		assert_eq!(
			eval(&rule(), "![x]({{ site.url }}{{ site.baseurl }}/resources/x.png)"),
			Some("![x]({static}/images/x.png)".to_string())
		);
	}

	#[test]
	fn test_migrated_links_not_claimed() {
		let rule = rule();
		assert_eq!(eval(&rule, "[a]({filename}/a.md)"), None);
		assert_eq!(eval(&rule, "![b]({static}/images/b.png)"), None);
		assert_eq!(eval(&rule, "plain text about post_url"), None);
	}
}
