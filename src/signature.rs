// src/signature.rs

//! Шаблоны подписи. Функции чистые: одинаковый вход даёт одинаковый выход.
//! Значения из каталога вставляются как есть, без экранирования HTML.

use crate::models::{CompanyInfo, UserRecord};

/// Базовое имя файлов подписи: `Firma-<Компания>` без пробелов
pub fn signature_name(company: &CompanyInfo) -> String {
    let name: String = company
        .name
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '-',
            c => c,
        })
        .collect();
    format!("Firma-{}", name)
}

/// Убирает из displayName известные суффиксы вроде "(Carton Group)"
pub fn clean_display_name(display_name: &str, company: &CompanyInfo) -> String {
    let mut name = display_name.to_string();
    for marker in &company.display_name_markers {
        if !marker.is_empty() {
            name = name.replace(marker.as_str(), "");
        }
    }
    name.trim().to_string()
}

/// HTML-версия подписи
pub fn render_html(user: &UserRecord, company: &CompanyInfo) -> String {
    let name = clean_display_name(&user.display_name, company);
    let primary = &company.primary_color;
    let secondary = &company.secondary_color;

    let mobile_html = if user.mobile.is_empty() {
        String::new()
    } else {
        format!("Mobile: {}<br>\n                    ", user.mobile)
    };

    let logo_html = if company.logo_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"
                <div style="margin-bottom: 15px;">
                    <img src="{}" alt="{}" style="max-width: 150px; height: auto; display: block;">
                </div>
"#,
            company.logo_url, company.name
        )
    };

    let website_html = if company.website.is_empty() {
        String::new()
    } else {
        format!(
            r#"
                <div style="margin-bottom: 10px; font-size: 12px;">
                    <a href="{}" style="color: {primary}; text-decoration: none;">{}</a>
                </div>
"#,
            website_href(&company.website),
            company.website
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="Generator" content="signdomen">
</head>
<body style="margin: 0; padding: 0; font-family: Arial, Helvetica, sans-serif;">
    <table cellpadding="0" cellspacing="0" border="0" style="font-family: Arial, Helvetica, sans-serif; font-size: 13px; line-height: 1.6; color: #333; max-width: 600px;">
        <tr>
            <td style="padding: 0; vertical-align: top;">
                <div style="margin-bottom: 10px;">
                    <strong style="font-size: 15px; color: #000; font-weight: bold;">{name}</strong><br>
                    <span style="font-size: 13px; color: {secondary};">{title}</span>
                </div>

                <div style="margin-bottom: 10px; padding-bottom: 10px;">
                    <strong style="font-size: 13px; color: {primary};">{company_name}</strong><br>
                    <span style="font-size: 12px; color: {secondary};">{address}</span>
                </div>

                <div style="margin-bottom: 15px; font-size: 12px; color: #333;">
                    Tel: {phone}<br>
                    {mobile_html}Mail: <a href="mailto:{email}" style="color: {primary}; text-decoration: none;">{email}</a>
                </div>
{logo_html}{website_html}
                <div style="margin-top: 15px; padding-top: 10px; border-top: 1px solid #cccccc; font-size: 9px; color: {secondary}; line-height: 1.3;">
                    {disclaimer}
                </div>
            </td>
        </tr>
    </table>
</body>
</html>"#,
        title = user.title,
        company_name = company.name,
        address = company.address,
        phone = user.phone,
        email = user.email,
        disclaimer = company.disclaimer,
    )
}

/// Текстовая версия подписи
pub fn render_text(user: &UserRecord, company: &CompanyInfo) -> String {
    let name = clean_display_name(&user.display_name, company);

    let mobile_txt = if user.mobile.is_empty() {
        String::new()
    } else {
        format!("\nMobile: {}", user.mobile)
    };

    format!(
        "{name}\n{title}\n\n{company_name}\n{address}\n\nTel: {phone}{mobile_txt}\nMail: {email}\n\n{website}\n\n{disclaimer}",
        title = user.title,
        company_name = company.name,
        address = company.address,
        phone = user.phone,
        email = user.email,
        website = company.website,
        disclaimer = company.disclaimer,
    )
}

fn website_href(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{}", website)
    }
}
