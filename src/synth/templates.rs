//! Sentence templates for article synthesis.
//!
//! Placeholders: `{topic}`, `{count}`, `{percent}`, `{or_low}`, `{or_high}`.
//! Every pool must stay non-empty.

pub const INTRODUCTION: &str = "مقدمه";
pub const METHODOLOGY: &str = "روش‌شناسی";
pub const RESULTS: &str = "نتایج";
pub const DISCUSSION: &str = "بحث و نتیجه‌گیری";

pub const TITLES: &[&str] = &[
    "مروری بر شواهد علمی درباره {topic}",
    "{topic}: آنچه متاآنالیزها می‌گویند",
    "تازه‌ترین یافته‌های پژوهشی درباره {topic}",
];

pub const INTRO_OPENERS: &[&str] = &[
    "{topic} یکی از موضوعات مهم در پزشکی امروز است و پژوهش‌های متعددی به بررسی آن پرداخته‌اند.",
    "در سال‌های اخیر توجه پژوهشگران به {topic} به‌طور چشمگیری افزایش یافته است.",
    "شناخت دقیق شواهد علمی درباره {topic} برای بیماران و پزشکان اهمیت ویژه‌ای دارد.",
];

pub const INTRO_CONTEXT: &[&str] = &[
    "این مقاله با تکیه بر {count} مطالعه مرور نظام‌مند و متاآنالیز، تصویری از شواهد موجود ارائه می‌دهد.",
    "در این نوشته، یافته‌های {count} متاآنالیز منتشرشده در پایگاه PubMed به زبان ساده مرور می‌شود.",
    "هدف این مرور، خلاصه‌سازی نتایج {count} مطالعه معتبر و کاربرد آن‌ها در زندگی روزمره است.",
];

pub const METHOD_SEARCH: &[&str] = &[
    "برای تهیه این مقاله، پایگاه PubMed با تمرکز بر متاآنالیزها و مرورهای نظام‌مند درباره {topic} جستجو شد.",
    "جستجوی نظام‌مند در پایگاه داده PubMed برای یافتن متاآنالیزهای مرتبط با {topic} انجام گرفت.",
];

pub const METHOD_SELECTION: &[&str] = &[
    "در نهایت {count} مطالعه که دارای چکیده کامل و داده‌های قابل استناد بودند انتخاب شدند.",
    "از میان نتایج، {count} مطالعه با بالاترین ارتباط موضوعی برای تحلیل برگزیده شد.",
    "معیار ورود، انتشار به‌صورت متاآنالیز یا مرور نظام‌مند بود و {count} مطالعه این معیار را داشتند.",
];

pub const RESULT_EFFECT: &[&str] = &[
    "نتایج نشان داد که مداخلات مرتبط با {topic} می‌توانند خطر عوارض را تا حدود {percent} درصد کاهش دهند.",
    "تحلیل ترکیبی داده‌ها حاکی از کاهش حدود {percent} درصدی در پیامدهای نامطلوب بود.",
    "بر اساس یافته‌ها، بهبودی در حدود {percent} درصد از شرکت‌کنندگان مشاهده شد.",
];

pub const RESULT_ODDS: &[&str] = &[
    "نسبت شانس گزارش‌شده در مطالعات بین {or_low} تا {or_high} متغیر بود.",
    "دامنه نسبت شانس در مطالعات بررسی‌شده از {or_low} تا {or_high} گزارش شد.",
];

pub const DISCUSSION_OPENERS: &[&str] = &[
    "یافته‌های این مرور با نتایج پژوهش‌های پیشین درباره {topic} همخوانی دارد.",
    "شواهد موجود از اهمیت توجه به {topic} در مراقبت‌های بالینی حمایت می‌کند.",
    "این نتایج بر نقش پیشگیری و مدیریت به‌موقع در {topic} تأکید دارد.",
];

pub const DISCUSSION_LIMITS: &[&str] = &[
    "با این حال، ناهمگونی میان مطالعات و تفاوت جمعیت‌های بررسی‌شده باید در تفسیر نتایج در نظر گرفته شود.",
    "لازم است پژوهش‌های بیشتری با حجم نمونه بزرگ‌تر برای تأیید این یافته‌ها انجام شود.",
];

pub const DISCUSSION_ADVICE: &str = "پیش از هر تصمیم درمانی، با پزشک خود مشورت کنید.";

/// Values interpolated into templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Facts<'a> {
    pub topic: &'a str,
    pub count: usize,
    pub percent: u32,
    pub or_low: f64,
    pub or_high: f64,
}

/// Substitute every placeholder in `template`.
pub fn fill(template: &str, facts: &Facts<'_>) -> String {
    template
        .replace("{topic}", facts.topic)
        .replace("{count}", &facts.count.to_string())
        .replace("{percent}", &facts.percent.to_string())
        .replace("{or_low}", &format!("{:.2}", facts.or_low))
        .replace("{or_high}", &format!("{:.2}", facts.or_high))
}
