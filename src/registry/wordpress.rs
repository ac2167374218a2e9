//! Built-in WordPress function tables.
//!
//! Argument positions are 1-based, as in the WordPress documentation.

/// Functions whose listed arguments are expected to arrive slashed.
pub const FULLY_SLASHED: &[(&str, &[(usize, &str)])] = &[
    // Uses add_metadata().
    ("add_comment_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("add_metadata", &[(3, "meta_key"), (4, "meta_value")]),
    ("add_ping", &[(2, "uri")]),
    ("add_post_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("add_term_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("add_user_meta", &[(2, "meta_key"), (3, "meta_value")]),
    // Interpolated straight into a query.
    ("check_comment", &[(1, "author"), (2, "email")]),
    ("comment_exists", &[(1, "comment_author")]),
    ("delete_comment_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("delete_metadata", &[(3, "meta_key"), (4, "meta_value")]),
    ("delete_post_meta_by_key", &[(1, "post_meta_key")]),
    ("delete_post_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("delete_term_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("delete_user_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("delete_user_option", &[(2, "option_name")]),
    ("edit_post", &[(1, "post_data")]),
    ("get_cat_ID", &[(1, "category_name")]),
    ("get_search_comments_feed_link", &[(1, "search_query")]),
    ("get_search_feed_link", &[(1, "search_query")]),
    ("get_search_link", &[(1, "query")]),
    // Only when getting the term by 'name'; see the selector rules.
    ("get_term_by", &[(2, "value")]),
    ("install_blog", &[(2, "blog_title")]),
    ("is_nav_menu", &[(1, "menu")]),
    ("post_exists", &[(1, "title"), (2, "content"), (3, "date")]),
    ("update_attached_file", &[(2, "file")]),
    ("update_comment_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("update_metadata", &[(3, "meta_key"), (4, "meta_value")]),
    ("update_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("update_post_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("update_term_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("update_user_meta", &[(2, "meta_key"), (3, "meta_value")]),
    ("term_exists", &[(1, "term")]),
    ("update_user_option", &[(2, "option_name"), (3, "newvalue")]),
    ("wp_add_object_terms", &[(2, "terms")]),
    ("wp_create_nav_menu", &[(1, "menu_name")]),
    ("wp_create_post_autosave", &[(1, "post_data")]),
    ("wp_delete_nav_menu", &[(1, "menu")]),
    ("wp_filter_comment", &[(1, "commentarr")]),
    ("wp_get_nav_menu_items", &[(1, "menu")]),
    ("wp_get_nav_menu_object", &[(1, "menu")]),
    ("wp_insert_comment", &[(1, "commentdata")]),
    ("wp_insert_link", &[(1, "linkdata")]),
    ("wp_insert_term", &[(1, "term")]),
    ("wp_new_comment", &[(1, "commentdata")]),
    ("wp_remove_object_terms", &[(2, "terms")]),
    ("wp_set_object_terms", &[(2, "terms")]),
    ("wp_set_post_categories", &[(2, "post_categories")]),
    ("wp_set_post_tags", &[(2, "tags")]),
    ("wp_set_post_terms", &[(2, "terms")]),
    ("wp_update_attachment_metadata", &[(2, "data")]),
    ("wp_update_comment", &[(1, "commentarr")]),
    ("wpmu_create_blog", &[(3, "title")]),
    ("wpmu_validate_blog_signup", &[(2, "blog_title")]),
    ("wpmu_welcome_notification", &[(4, "title")]),
    ("WP_Press_This::side_load_images", &[(2, "content")]),
    ("WP_Customize_Setting::sanitize", &[(1, "value")]),
];

const POST_FIELDS: &[&str] = &[
    "post_content",
    "post_content_filtered",
    "post_title",
    "post_excerpt",
    "post_password",
    "to_ping",
    "pinged",
    "guid",
    "post_category",
    "tags_input",
    "tax_input",
    "meta_input",
];

const QUERY_FIELDS: &[&str] = &["s", "title"];

/// Functions taking an array argument in which only some keys must be slashed.
pub const PARTLY_SLASHED: &[(&str, &[(usize, &[&str])])] = &[
    ("_wp_ajax_menu_quick_search", &[(1, &["q"])]),
    ("get_children", &[(1, QUERY_FIELDS)]),
    ("get_bookmarks", &[(1, &["category_name"])]),
    ("get_pages", &[(1, &["meta_key", "meta_value"])]),
    ("get_posts", &[(1, QUERY_FIELDS)]),
    ("query_posts", &[(1, QUERY_FIELDS)]),
    (
        "wp_allow_comment",
        &[(
            1,
            &[
                "comment_author",
                "comment_author_email",
                "comment_author_url",
                "comment_author_IP",
                "comment_content",
                "comment_agent",
            ],
        )],
    ),
    ("wp_get_nav_menu_items", &[(2, QUERY_FIELDS)]),
    ("wp_get_post_revisions", &[(2, QUERY_FIELDS)]),
    ("wp_get_recent_posts", &[(1, QUERY_FIELDS)]),
    ("wp_insert_attachment", &[(1, POST_FIELDS)]),
    ("wp_insert_post", &[(1, POST_FIELDS)]),
    // 'name' is always overridden by $term.
    ("wp_insert_term", &[(3, &["description"])]),
    (
        "wp_update_nav_menu_item",
        &[(
            3,
            &[
                "menu-item-description",
                "menu-item-attr-title",
                "menu-item-title",
            ],
        )],
    ),
    ("wp_update_nav_menu_object", &[(2, &["description", "menu-name"])]),
    ("wp_update_post", &[(1, POST_FIELDS)]),
    ("wp_update_term", &[(3, &["description", "name"])]),
    (
        "WP_Customize_Nav_Menus::search_available_items_query",
        &[(1, &["s"])],
    ),
    ("WP_Query::__construct", &[(1, QUERY_FIELDS)]),
    ("WP_Query::parse_query", &[(1, QUERY_FIELDS)]),
    ("WP_Query::query", &[(1, QUERY_FIELDS)]),
    ("_WP_Editors::wp_link_query", &[(1, &["s"])]),
];

const USER_SLASHED: &[&str] = &[
    "description",
    "display_name",
    "first_name",
    "last_name",
    "nickname",
    "user_email",
    "user_url",
];

/// (function, [(argument, slashed keys, unslashed keys)])
pub type MixedEntry = (&'static str, &'static [(usize, &'static [&'static str], &'static [&'static str])]);

/// Functions taking an array argument with both slashed and unslashed keys.
pub const MIXED_SLASHED: &[MixedEntry] = &[
    // 'category_name' is only slashed when 'categorize' is false.
    (
        "wp_list_bookmarks",
        &[(
            1,
            &["category_name"],
            &[
                "title_li",
                "title_before",
                "title_after",
                "class",
                "category_before",
                "category_after",
            ],
        )],
    ),
    (
        "wp_dropdown_pages",
        &[(
            1,
            &["meta_key", "meta_value"],
            &[
                "selected",
                "name",
                "id",
                "show_option_none",
                "show_option_no_change",
                "option_none_value",
            ],
        )],
    ),
    (
        "wp_list_pages",
        &[(
            1,
            &["meta_key", "meta_value"],
            &["date_format", "link_after", "link_before", "title_li"],
        )],
    ),
    // The password is hashed before unslashing.
    ("wp_insert_user", &[(1, USER_SLASHED, &["user_pass"])]),
    ("wp_update_user", &[(1, USER_SLASHED, &["user_pass"])]),
];

pub const SLASHING_FUNCTIONS: &[&str] = &["wp_slash"];

/// Functions whose return value never needs slashing.
pub const AUTO_SLASHING_FUNCTIONS: &[&str] = &[
    "esc_url_raw",
    "esc_url",
    "get_current_user_id",
    "sanitize_key",
    "sanitize_title",
    "sanitize_title_with_dashes",
    "time",
    "wp_filter_comment",
];

pub const NONCE_VERIFICATION_FUNCTIONS: &[&str] = &[
    "wp_verify_nonce",
    "check_admin_referer",
    "check_ajax_referer",
];

pub const INPUT_SUPERGLOBALS: &[&str] = &[
    "$_COOKIE",
    "$_GET",
    "$_FILES",
    "$_POST",
    "$_REQUEST",
    "$_SERVER",
];

pub const NONCE_ERROR_SUPERGLOBALS: &[&str] = &["$_POST"];

pub const NONCE_WARN_SUPERGLOBALS: &[&str] = &["$_GET", "$_REQUEST"];

/// `get_term_by()` only unslashes its value when getting the term by name.
pub const SELECTORS: &[(&str, usize, &str)] = &[("get_term_by", 1, "name")];
