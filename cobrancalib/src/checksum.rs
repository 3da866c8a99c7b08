//! Контрольные цифры: модуль 10 и семейство модуля 11.
//!
//! Всё здесь — чистые функции от входной строки и параметров правила.
//! Пустой ввод трактуется как "0", нецифровой символ весит 0, но занимает позицию.

/// Значение, которым правило mod11 сообщает «допустимой цифры нет».
pub const INVALID: u32 = 10;

pub const WEIGHTS_2_9: &[u32] = &[2, 3, 4, 5, 6, 7, 8, 9];
pub const WEIGHTS_9_2: &[u32] = &[9, 8, 7, 6, 5, 4, 3, 2];
pub const WEIGHTS_2_7: &[u32] = &[2, 3, 4, 5, 6, 7];
pub const WEIGHTS_2_8: &[u32] = &[2, 3, 4, 5, 6, 7, 8];
pub const WEIGHTS_3_1_9_7: &[u32] = &[3, 1, 9, 7];

fn digit_values(digits: &str) -> Vec<u32> {
    let trimmed = digits.trim();
    if trimmed.is_empty() {
        return vec![0];
    }
    trimmed.chars().map(|c| c.to_digit(10).unwrap_or(0)).collect()
}

/// Модуль 10: справа налево веса 2,1,2,1…; произведение ≥ 10 сворачивается вычитанием 9.
pub fn mod10(digits: &str) -> u32 {
    let total: u32 = digit_values(digits)
        .into_iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            let p = if i % 2 == 0 { d * 2 } else { d };
            if p >= 10 {
                p - 9
            } else {
                p
            }
        })
        .sum();
    (10 - total % 10) % 10
}

/// Отображение взвешенной суммы в «сырое» значение цифры.
pub type Transform = fn(u32) -> u32;

/// `sum mod 11`
pub fn remainder(sum: u32) -> u32 {
    sum % 11
}

/// `11 − (sum mod 11)`, значения 1..=11.
pub fn eleven_minus(sum: u32) -> u32 {
    11 - sum % 11
}

/// Остаток 0 → 0, остаток 1 → [`INVALID`], иначе `11 − r`.
pub fn eleven_minus_or_invalid(sum: u32) -> u32 {
    match sum % 11 {
        0 => 0,
        1 => INVALID,
        r => 11 - r,
    }
}

/// Порядок, в котором веса прикладываются к цифрам.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    RightToLeft,
    LeftToRight,
}

/// Правило модуля 11: цикл весов, направление, преобразование суммы
/// и таблица замен для значений без допустимой цифры.
#[derive(Debug, Clone, Copy)]
pub struct Mod11 {
    weights: &'static [u32],
    direction: Direction,
    transform: Transform,
    map: &'static [(u32, char)],
}

impl Mod11 {
    /// Общий DV штрихкода: веса 2..9, `11 − r`, значения 0/10/11 → 1.
    pub const BARCODE: Mod11 =
        Mod11::new(WEIGHTS_2_9).with_map(&[(0, '1'), (10, '1'), (11, '1')]);

    pub const fn new(weights: &'static [u32]) -> Self {
        Self {
            weights,
            direction: Direction::RightToLeft,
            transform: eleven_minus,
            map: &[],
        }
    }

    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub const fn with_map(mut self, map: &'static [(u32, char)]) -> Self {
        self.map = map;
        self
    }

    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn weighted_sum(&self, digits: &str) -> u32 {
        let values = digit_values(digits);
        let cycle = self.weights.iter().cycle();
        match self.direction {
            Direction::RightToLeft => values.iter().rev().zip(cycle).map(|(d, w)| d * w).sum(),
            Direction::LeftToRight => values.iter().zip(cycle).map(|(d, w)| d * w).sum(),
        }
    }

    /// Значение после преобразования, до таблицы замен.
    pub fn value(&self, digits: &str) -> u32 {
        (self.transform)(self.weighted_sum(digits))
    }

    /// Итоговая цифра или символ. `None`, если значение ≥ 10 и замены для него нет.
    pub fn digit(&self, digits: &str) -> Option<char> {
        let value = self.value(digits);
        if let Some((_, c)) = self.map.iter().find(|(k, _)| *k == value) {
            return Some(*c);
        }
        char::from_digit(value, 10)
    }
}

impl Default for Mod11 {
    fn default() -> Self {
        Mod11::new(WEIGHTS_2_9)
    }
}

/// Двойной DV: первая цифра mod10, вторая — `second` поверх строки с первой цифрой.
/// Если у второй нет допустимой цифры (значение [`INVALID`] без замены), первая
/// увеличивается на 1 (9 → 0) и вторая пересчитывается. Повтор ровно один.
/// Правило с заменой для 10 никогда не повторяет: это просто цепочка mod10 + mod11.
pub fn dual_digit(digits: &str, second: &Mod11) -> Option<String> {
    let digits = digits.trim();
    let mut first = mod10(digits);
    let mut second_digit = second.digit(&format!("{digits}{first}"));
    if second_digit.is_none() {
        first = (first + 1) % 10;
        second_digit = second.digit(&format!("{digits}{first}"));
    }
    Some(format!("{first}{}", second_digit?))
}
