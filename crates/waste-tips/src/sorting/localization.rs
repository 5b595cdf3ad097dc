use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

/// Language used when a request names an unsupported code.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Last-resort text when not even the fallback locale carries a message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// User-facing failure categories of the sorting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPostalCode,
    InvalidImage,
    RecaptchaFailed,
    ProcessingError,
    MissingFields,
}

impl ErrorKind {
    pub const ALL: [Self; 5] = [
        Self::InvalidPostalCode,
        Self::InvalidImage,
        Self::RecaptchaFailed,
        Self::ProcessingError,
        Self::MissingFields,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::InvalidPostalCode => "invalid_postal_code",
            Self::InvalidImage => "invalid_image",
            Self::RecaptchaFailed => "recaptcha_failed",
            Self::ProcessingError => "processing_error",
            Self::MissingFields => "missing_fields",
        }
    }
}

/// Error strings for a single locale.
#[derive(Debug, Clone, Copy)]
pub struct LocaleMessages {
    pub invalid_postal_code: &'static str,
    pub invalid_image: &'static str,
    pub recaptcha_failed: &'static str,
    pub processing_error: &'static str,
    pub missing_fields: &'static str,
}

impl LocaleMessages {
    pub const fn get(&self, kind: ErrorKind) -> &'static str {
        match kind {
            ErrorKind::InvalidPostalCode => self.invalid_postal_code,
            ErrorKind::InvalidImage => self.invalid_image,
            ErrorKind::RecaptchaFailed => self.recaptcha_failed,
            ErrorKind::ProcessingError => self.processing_error,
            ErrorKind::MissingFields => self.missing_fields,
        }
    }
}

/// Supported language with its English name, used when prompting the model.
#[derive(Debug, Clone, Copy)]
pub struct LocaleEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub messages: LocaleMessages,
}

/// Read-only lookup over the locale catalog, built once per process.
#[derive(Debug)]
pub struct Localizer {
    catalog: &'static [LocaleEntry],
    entries: HashMap<&'static str, &'static LocaleEntry>,
}

impl Localizer {
    pub fn new() -> Self {
        Self::from_entries(&CATALOG)
    }

    pub(crate) fn from_entries(entries: &'static [LocaleEntry]) -> Self {
        Self {
            catalog: entries,
            entries: entries.iter().map(|entry| (entry.code, entry)).collect(),
        }
    }

    /// Process-wide instance shared by every request.
    pub fn shared() -> Arc<Localizer> {
        static SHARED: OnceLock<Arc<Localizer>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Localizer::new())).clone()
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Returns `code` when supported, otherwise the fallback language.
    pub fn normalize(&self, code: &str) -> &'static str {
        match self.entries.get(code) {
            Some(entry) => entry.code,
            None => FALLBACK_LANGUAGE,
        }
    }

    pub fn language_name(&self, code: &str) -> &'static str {
        self.entries
            .get(code)
            .or_else(|| self.entries.get(FALLBACK_LANGUAGE))
            .map(|entry| entry.name)
            .unwrap_or("English")
    }

    pub fn error_message(&self, code: &str, kind: ErrorKind) -> &'static str {
        let lookup = |code: &str| {
            self.entries
                .get(code)
                .map(|entry| entry.messages.get(kind))
                .filter(|message| !message.is_empty())
        };

        lookup(code)
            .or_else(|| lookup(FALLBACK_LANGUAGE))
            .unwrap_or(GENERIC_ERROR_MESSAGE)
    }

    /// Supported languages in catalog order.
    pub fn languages(&self) -> impl Iterator<Item = &'static LocaleEntry> {
        self.catalog.iter()
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

const fn locale(
    code: &'static str,
    name: &'static str,
    messages: [&'static str; 5],
) -> LocaleEntry {
    LocaleEntry {
        code,
        name,
        messages: LocaleMessages {
            invalid_postal_code: messages[0],
            invalid_image: messages[1],
            recaptcha_failed: messages[2],
            processing_error: messages[3],
            missing_fields: messages[4],
        },
    }
}

// Message order: invalid postal code, invalid image, reCAPTCHA failure,
// processing error, missing fields.
static CATALOG: [LocaleEntry; 25] = [
    locale(
        "de",
        "German",
        [
            "Ungültige deutsche Postleitzahl",
            "Ungültige Bilddatei",
            "reCAPTCHA-Verifizierung fehlgeschlagen",
            "Fehler bei der Verarbeitung Ihrer Anfrage",
            "Pflichtfelder fehlen",
        ],
    ),
    locale(
        "en",
        "English",
        [
            "Invalid German postal code",
            "Invalid image file",
            "reCAPTCHA verification failed",
            "Error processing your request",
            "Missing required fields",
        ],
    ),
    locale(
        "tr",
        "Turkish",
        [
            "Geçersiz Alman posta kodu",
            "Geçersiz resim dosyası",
            "reCAPTCHA doğrulaması başarısız",
            "İsteğinizi işleme hatası",
            "Gerekli alanlar eksik",
        ],
    ),
    locale(
        "ru",
        "Russian",
        [
            "Неверный немецкий почтовый индекс",
            "Неверный файл изображения",
            "Проверка reCAPTCHA не удалась",
            "Ошибка обработки вашего запроса",
            "Отсутствуют обязательные поля",
        ],
    ),
    locale(
        "pl",
        "Polish",
        [
            "Nieprawidłowy niemiecki kod pocztowy",
            "Nieprawidłowy plik obrazu",
            "Weryfikacja reCAPTCHA nie powiodła się",
            "Błąd przetwarzania Twojego żądania",
            "Brakuje wymaganych pól",
        ],
    ),
    locale(
        "ar",
        "Arabic",
        [
            "رمز بريدي ألماني غير صالح",
            "ملف صورة غير صالح",
            "فشل التحقق من reCAPTCHA",
            "خطأ في معالجة طلبك",
            "حقول مطلوبة مفقودة",
        ],
    ),
    locale(
        "ku",
        "Kurdish",
        [
            "Koda postê ya Almanî ya nederust",
            "Pelê wêneyê nederust",
            "Piştrastkirina reCAPTCHA têk çû",
            "Di pêvajoya daxwaza te de çewtî",
            "Zeviyên pêwîst kêm in",
        ],
    ),
    locale(
        "it",
        "Italian",
        [
            "Codice postale tedesco non valido",
            "File immagine non valido",
            "Verifica reCAPTCHA fallita",
            "Errore nell'elaborazione della richiesta",
            "Campi obbligatori mancanti",
        ],
    ),
    locale(
        "bs",
        "Bosnian",
        [
            "Neispravan njemački poštanski broj",
            "Neispravna datoteka slike",
            "reCAPTCHA provjera neuspješna",
            "Greška pri obradi zahtjeva",
            "Nedostaju obavezna polja",
        ],
    ),
    locale(
        "hr",
        "Croatian",
        [
            "Neispravan njemački poštanski broj",
            "Neispravna datoteka slike",
            "reCAPTCHA provjera neuspješna",
            "Greška pri obradi zahtjeva",
            "Nedostaju obavezna polja",
        ],
    ),
    locale(
        "sr",
        "Serbian",
        [
            "Неисправан немачки поштански број",
            "Неисправна датотека слике",
            "reCAPTCHA провера неуспешна",
            "Грешка при обради захтева",
            "Недостају обавезна поља",
        ],
    ),
    locale(
        "ro",
        "Romanian",
        [
            "Cod poștal german invalid",
            "Fișier imagine invalid",
            "Verificarea reCAPTCHA a eșuat",
            "Eroare la procesarea cererii",
            "Câmpuri obligatorii lipsă",
        ],
    ),
    locale(
        "el",
        "Greek",
        [
            "Μη έγκυρος γερμανικός ταχυδρομικός κώδικας",
            "Μη έγκυρο αρχείο εικόνας",
            "Η επαλήθευση reCAPTCHA απέτυχε",
            "Σφάλμα επεξεργασίας του αιτήματός σας",
            "Λείπουν υποχρεωτικά πεδία",
        ],
    ),
    locale(
        "es",
        "Spanish",
        [
            "Código postal alemán inválido",
            "Archivo de imagen inválido",
            "Verificación reCAPTCHA fallida",
            "Error procesando su solicitud",
            "Faltan campos requeridos",
        ],
    ),
    locale(
        "fr",
        "French",
        [
            "Code postal allemand invalide",
            "Fichier image invalide",
            "Échec de la vérification reCAPTCHA",
            "Erreur lors du traitement de votre demande",
            "Champs requis manquants",
        ],
    ),
    locale(
        "hi",
        "Hindi",
        [
            "अमान्य जर्मन पोस्टल कोड",
            "अमान्य छवि फ़ाइल",
            "reCAPTCHA सत्यापन विफल",
            "आपके अनुरोध को संसाधित करने में त्रुटि",
            "आवश्यक फ़ील्ड गुम हैं",
        ],
    ),
    locale(
        "ur",
        "Urdu",
        [
            "غلط جرمن پوسٹل کوڈ",
            "غلط تصویری فائل",
            "reCAPTCHA تصدیق ناکام",
            "آپ کی درخواست پر عمل کرنے میں خرابی",
            "ضروری فیلڈز غائب ہیں",
        ],
    ),
    locale(
        "vi",
        "Vietnamese",
        [
            "Mã bưu điện Đức không hợp lệ",
            "Tệp hình ảnh không hợp lệ",
            "Xác minh reCAPTCHA thất bại",
            "Lỗi xử lý yêu cầu của bạn",
            "Thiếu các trường bắt buộc",
        ],
    ),
    locale(
        "zh",
        "Chinese (Simplified)",
        [
            "无效的德国邮政编码",
            "无效的图像文件",
            "reCAPTCHA验证失败",
            "处理您的请求时出错",
            "缺少必填字段",
        ],
    ),
    locale(
        "fa",
        "Persian",
        [
            "کد پستی آلمان نامعتبر",
            "فایل تصویر نامعتبر",
            "تأیید reCAPTCHA ناموفق",
            "خطا در پردازش درخواست شما",
            "فیلدهای ضروری موجود نیست",
        ],
    ),
    locale(
        "ps",
        "Pashto",
        [
            "د آلمان د پوستې غلط کوډ",
            "د انځور غلط دوتنه",
            "د reCAPTCHA تصدیق ناکام",
            "ستاسو د غوښتنې پروسس کولو کې تېروتنه",
            "اړین ساحې ورک دي",
        ],
    ),
    locale(
        "ta",
        "Tamil",
        [
            "தவறான ஜெர்மன் அஞ்சல் குறியீடு",
            "தவறான படக் கோப்பு",
            "reCAPTCHA சரிபார்ப்பு தோல்வி",
            "உங்கள் கோரிக்கையை செயலாக்குவதில் பிழை",
            "தேவையான புலங்கள் காணவில்லை",
        ],
    ),
    locale(
        "sq",
        "Albanian",
        [
            "Kod postar gjerman i pavlefshëm",
            "Skedar imazhi i pavlefshëm",
            "Verifikimi reCAPTCHA dështoi",
            "Gabim në përpunimin e kërkesës suaj",
            "Mungojnë fushat e detyrueshme",
        ],
    ),
    locale(
        "da",
        "Danish",
        [
            "Ugyldig tysk postnummer",
            "Ugyldig billedfil",
            "reCAPTCHA-verifikation mislykkedes",
            "Fejl ved behandling af din anmodning",
            "Manglende påkrævede felter",
        ],
    ),
    locale(
        "uk",
        "Ukrainian",
        [
            "Недійсний німецький поштовий індекс",
            "Недійсний файл зображення",
            "Перевірка reCAPTCHA не вдалася",
            "Помилка обробки вашого запиту",
            "Відсутні обов'язкові поля",
        ],
    ),
];
