/// `glam::Vec3` with a bincode encoding, for storing in assets.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Vec3(pub(crate) glam::Vec3);

impl From<glam::Vec3> for Vec3 {
    fn from(value: glam::Vec3) -> Self {
        Vec3(value)
    }
}

impl From<Vec3> for glam::Vec3 {
    fn from(value: Vec3) -> Self {
        value.0
    }
}

impl bincode::Encode for Vec3 {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&self.0.to_array(), encoder)
    }
}

impl bincode::Decode for Vec3 {
    fn decode<D: bincode::de::Decoder>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let v: [f32; 3] = bincode::Decode::decode(decoder)?;
        Ok(Self(glam::Vec3::from_array(v)))
    }
}

impl<'de> bincode::BorrowDecode<'de> for Vec3 {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        bincode::Decode::decode(decoder)
    }
}
