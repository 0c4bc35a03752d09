/// Template written by `md-migrate --init`.
pub fn generate_init_template() -> String {
	r#"# md-migrate configuration
#
# Files named .md-migrate.toml are discovered from the current directory
# upwards; `root = true` stops the walk (~/.md-migrate.toml is still read).
root = true

[front-matter]
# Keep the time of day in `date:` fields. The zone offset is always dropped.
keep-time = false

# Source key -> Pelican key. Defaults: description, excerpt -> summary and
# last_modified_at -> modified.
[front-matter.rename]
# permalink = "slug"

[links]
# Directory prepended to {% post_url %} targets, relative to the content root.
post-prefix = ""

# {{ site.url }}/resources/x.png -> {static}/images/x.png
# static-paths = [{ from = "/resources/", to = "/images/" }]

# Extra sed-style rewrites, applied after the built-in rules.
# [[substitutions]]
# name = "kbd"
# rewrite = "s/<kbd>([^<]*)<\\/kbd>/`$1`/g"
"#
	.to_string()
}
